//! Backend-agnostic window session trait
//!
//! The application only needs a handful of window operations during bootstrap:
//! create the window, ask the windowing library what the graphics runtime needs
//! from it, and pump events until the user closes it.

use thiserror::Error;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// The windowing library could not be initialized
    #[error("Window system initialization failed: {0}")]
    InitializationFailed(String),

    /// The native window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// The windowing library cannot present Vulkan output
    #[error("Vulkan cannot render to screen")]
    VulkanUnsupported,
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Window owned by the application for its whole lifetime
///
/// The window is released when the value is dropped. Window operations are
/// expected to run on the main thread, so no `Send` bound is imposed.
pub trait WindowSession {
    /// Open a window with the given title and client area size
    fn create(title: &str, width: u32, height: u32) -> WindowResult<Self>
    where
        Self: Sized;

    /// Whether the user asked the window to close
    fn should_close(&self) -> bool;

    /// Process pending window system events
    fn poll_events(&mut self);

    /// Whether the windowing library found a usable Vulkan loader
    fn vulkan_supported(&self) -> bool;

    /// Instance extensions the windowing library needs to present output
    fn required_instance_extensions(&self) -> WindowResult<Vec<String>>;
}
