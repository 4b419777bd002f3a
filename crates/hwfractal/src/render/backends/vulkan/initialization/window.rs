//! Window management using GLFW
//!
//! Provides the native window for Vulkan output. The window has no client
//! API (no OpenGL context) and a fixed size.

use crate::render::window::{WindowError, WindowResult, WindowSession};

/// GLFW window wrapper with proper resource management
pub struct GlfwWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    glfw: glfw::Glfw,
}

impl WindowSession for GlfwWindow {
    fn create(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{:?}", e)))?;

        // Vulkan renders into the window, no OpenGL context
        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(false));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_close_polling(true);
        log::debug!("Created {}x{} window \"{}\"", width, height, title);

        Ok(Self {
            window,
            events,
            glfw,
        })
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn poll_events(&mut self) {
        self.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&self.events) {
            if let glfw::WindowEvent::Close = event {
                log::debug!("Window close requested");
            }
        }
    }

    fn vulkan_supported(&self) -> bool {
        self.glfw.vulkan_supported()
    }

    fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or(WindowError::VulkanUnsupported)
    }
}

impl Drop for GlfwWindow {
    fn drop(&mut self) {
        log::debug!("Destroying window");
    }
}
