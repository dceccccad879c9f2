pub mod bindings;
pub mod panel;
pub mod renderer;
