// Vulkan initialization components

pub mod context;
pub mod window;

pub use context::*;
pub use window::*;
