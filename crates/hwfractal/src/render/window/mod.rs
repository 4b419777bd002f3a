//! Window management subsystem
//!
//! - **`backend`**: the [`WindowSession`] trait every window implementation provides
//! - The GLFW implementation lives with the Vulkan backend (`backends/vulkan`)

pub mod backend;

pub use backend::{WindowError, WindowResult, WindowSession};
