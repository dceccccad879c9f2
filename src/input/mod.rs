pub mod manager;

use winit::dpi::PhysicalSize;
use winit::keyboard::KeyCode;

/// Window input, reduced to what the showcase reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent
{
        /// Pointer position in logical pixels from the top-left corner.
        PointerMoved
        {
                x: f64,
                y: f64,
        },
        KeyPressed(KeyCode),
        Resized
        {
                size: PhysicalSize<u32>,
                scale_factor: f64,
        },
}
