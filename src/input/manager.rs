use crate::input::InputEvent;
use derivative::Derivative;
use std::collections::HashMap;
use winit::dpi::PhysicalSize;
use winit::keyboard::KeyCode;

type KeyAction<T> = Box<dyn Fn(&mut T)>;
type PointerAction<T> = Box<dyn Fn(&mut T, f64, f64)>;
type ResizeAction<T> = Box<dyn Fn(&mut T, PhysicalSize<u32>, f64)>;

/// Routes input events to handlers acting on `T`.
///
/// Each slot holds at most one handler: registering again replaces the
/// previous one, so reinstalling never stacks duplicates.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct InputManager<T>
{
        #[derivative(Debug = "ignore")]
        key_actions: HashMap<KeyCode, KeyAction<T>>,

        #[derivative(Debug = "ignore")]
        pointer_action: Option<PointerAction<T>>,

        #[derivative(Debug = "ignore")]
        resize_action: Option<ResizeAction<T>>,
}

impl<T> Default for InputManager<T>
{
        fn default() -> Self
        {
                Self::new()
        }
}

impl<T> InputManager<T>
{
        pub fn new() -> Self
        {
                Self {
                        key_actions: HashMap::new(),
                        pointer_action: None,
                        resize_action: None,
                }
        }

        pub fn on_key<F>(
                &mut self,
                key: KeyCode,
                callback: F,
        ) where
                F: 'static + Fn(&mut T),
        {
                if self.key_actions.insert(key, Box::new(callback)).is_some()
                {
                        log::debug!("Replaced handler for {key:?}");
                }
        }

        pub fn on_pointer<F>(
                &mut self,
                callback: F,
        ) where
                F: 'static + Fn(&mut T, f64, f64),
        {
                self.pointer_action = Some(Box::new(callback));
        }

        pub fn on_resize<F>(
                &mut self,
                callback: F,
        ) where
                F: 'static + Fn(&mut T, PhysicalSize<u32>, f64),
        {
                self.resize_action = Some(Box::new(callback));
        }

        /// Number of registered handlers across all slots.
        pub fn listener_count(&self) -> usize
        {
                self.key_actions.len()
                        + self.pointer_action.is_some() as usize
                        + self.resize_action.is_some() as usize
        }

        /// Runs the handler for `event`. Returns false if none is registered.
        pub fn dispatch(
                &self,
                event: &InputEvent,
                target: &mut T,
        ) -> bool
        {
                match *event
                {
                        InputEvent::PointerMoved {
                                x,
                                y,
                        } => match &self.pointer_action
                        {
                                Some(action) =>
                                {
                                        action(target, x, y);
                                        true
                                }
                                None => false,
                        },
                        InputEvent::KeyPressed(code) => match self.key_actions.get(&code)
                        {
                                Some(action) =>
                                {
                                        action(target);
                                        true
                                }
                                None => false,
                        },
                        InputEvent::Resized {
                                size,
                                scale_factor,
                        } => match &self.resize_action
                        {
                                Some(action) =>
                                {
                                        action(target, size, scale_factor);
                                        true
                                }
                                None => false,
                        },
                }
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[derive(Default)]
        struct Counter
        {
                keys: u32,
                last_pointer: Option<(f64, f64)>,
                resizes: u32,
        }

        #[test]
        fn registering_twice_replaces()
        {
                let mut input = InputManager::<Counter>::new();
                let mut counter = Counter::default();

                input.on_key(KeyCode::KeyS, |c| c.keys += 1);
                input.on_key(KeyCode::KeyS, |c| c.keys += 10);
                input.on_resize(|c, _, _| c.resizes += 1);
                input.on_resize(|c, _, _| c.resizes += 1);

                input.dispatch(&InputEvent::KeyPressed(KeyCode::KeyS), &mut counter);
                input.dispatch(
                        &InputEvent::Resized {
                                size: PhysicalSize::new(10, 10),
                                scale_factor: 1.0,
                        },
                        &mut counter,
                );

                assert_eq!(counter.keys, 10);
                assert_eq!(counter.resizes, 1);
                assert_eq!(input.listener_count(), 2);
        }

        #[test]
        fn unbound_events_are_reported()
        {
                let input = InputManager::<Counter>::new();
                let mut counter = Counter::default();

                assert!(!input.dispatch(&InputEvent::KeyPressed(KeyCode::KeyQ), &mut counter));
                assert!(!input.dispatch(&InputEvent::PointerMoved { x: 1.0, y: 2.0 }, &mut counter));
        }

        #[test]
        fn pointer_receives_coordinates()
        {
                let mut input = InputManager::<Counter>::new();
                let mut counter = Counter::default();

                input.on_pointer(|c, x, y| c.last_pointer = Some((x, y)));
                input.dispatch(&InputEvent::PointerMoved { x: 3.0, y: 4.0 }, &mut counter);

                assert_eq!(counter.last_pointer, Some((3.0, 4.0)));
        }
}
