//! Vulkan backend implementation
//!
//! GLFW window plus the `ash`-based runtime used during bootstrap.

/// Vulkan initialization types (context, window)
pub mod initialization;

// Re-export core initialization types
pub use initialization::context::{
    LogicalDevice, VulkanError, VulkanInstance, VulkanResult, VulkanRuntime,
};
pub use initialization::window::GlfwWindow;
