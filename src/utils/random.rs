/// Uniform-ish integer in `0..max`. `max` must be non-zero.
pub fn get_random_u128(max: u128) -> anyhow::Result<u128, getrandom::Error>
{
        let mut buf = [0u8; 16];

        getrandom::fill(&mut buf)?;

        Ok(u128::from_ne_bytes(buf) % max.max(1))
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn stays_below_max()
        {
                for _ in 0..32
                {
                        assert!(get_random_u128(10).unwrap() < 10);
                }
        }
}
