use crate::config::Config;
use crate::utils::random::get_random_u128;
use colored::*;

pub fn get_exit_message(config: &Config) -> String
{
        if !config.show_exit_message
        {
                return String::new();
        }

        let messages = [
                ("The display case has been locked for the night.", "red"),
                ("Lights dimmed, curtain drawn. Showcase closed.", "magenta"),
                ("The turntable has stopped spinning.", "yellow"),
                ("Exhibit returned to storage.", "cyan"),
                ("The gallery is empty. See you at the next viewing.", "green"),
                ("All spotlights switched off.", "blue"),
                ("The velvet rope is back up.", "purple"),
                ("Showcase wrapped in bubble wrap and shipped.", "white"),
                ("The model has left the pedestal.", "bright red"),
                ("Viewing hours are over.", "bright yellow"),
        ];

        let choice = get_random_u128(messages.len() as u128).unwrap_or(0) as usize;

        let Some((message, color)) = messages.get(choice)
        else
        {
                return String::new();
        };

        match *color
        {
                "red" => message.red().to_string(),
                "magenta" => message.magenta().to_string(),
                "yellow" => message.yellow().to_string(),
                "cyan" => message.cyan().to_string(),
                "green" => message.green().to_string(),
                "blue" => message.blue().to_string(),
                "purple" => message.purple().to_string(),
                "white" => message.white().to_string(),
                "bright red" => message.bright_red().to_string(),
                "bright yellow" => message.bright_yellow().to_string(),
                _ => message.to_string(),
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn silenced_exit_is_empty()
        {
                let config = Config {
                        show_exit_message: false,
                        ..Config::default()
                };

                assert!(get_exit_message(&config).is_empty());
        }

        #[test]
        fn exit_message_is_picked()
        {
                assert!(!get_exit_message(&Config::default()).is_empty());
        }
}
