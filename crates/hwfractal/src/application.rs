//! Application bootstrap and lifecycle
//!
//! [`Application`] owns every native resource acquired during start-up:
//!
//! 1. window
//! 2. graphics runtime (loader)
//! 3. instance, created with the negotiated extensions and layers
//! 4. logical device and its graphics queue, on the selected physical device
//!
//! Resources are released in the reverse order. When a stage fails, the stages
//! already completed are released the same way before the error is returned.

use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::render::backend::{DeviceRequest, GraphicsRuntime};
use crate::render::backends::vulkan::{GlfwWindow, VulkanError, VulkanRuntime};
use crate::render::capability::{
    negotiate, CapabilityClass, CapabilityError, EnabledCapabilitySet,
};
use crate::render::device::{self, DeviceChooser, SelectionError, SelectionResult};
use crate::render::window::{WindowError, WindowSession};

/// Priority of the single graphics queue
const GRAPHICS_QUEUE_PRIORITY: f32 = 1.0;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// The window could not be created or cannot host Vulkan output
    #[error("Failed to create window: {0}")]
    Window(#[from] WindowError),

    /// The runtime is missing or one of its calls failed
    #[error("Failed to init Vulkan: {0}")]
    Initialization(#[from] VulkanError),

    /// A required extension or layer is not available
    #[error("Capability negotiation failed: {0}")]
    Capability(#[from] CapabilityError),

    /// No usable physical device
    #[error("Failed to pick physical device: {0}")]
    NoDevice(#[from] SelectionError),

    /// The runtime rejected logical device creation
    #[error("Failed to create logical device: {0}")]
    DeviceCreation(VulkanError),

    /// The configuration is unusable
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Window, instance and device owned for the lifetime of the program
///
/// Fields drop in declaration order, which is the reverse of acquisition.
pub struct Application<W: WindowSession, R: GraphicsRuntime> {
    device: R::Device,
    instance: R::Instance,
    runtime: R,
    window: W,
    selection: SelectionResult,
    enabled_extensions: Vec<String>,
    enabled_layers: Vec<String>,
    enabled_device_extensions: Vec<String>,
}

/// Application on GLFW and the system Vulkan loader
pub type VulkanApplication = Application<GlfwWindow, VulkanRuntime>;

impl<W: WindowSession, R: GraphicsRuntime> Application<W, R> {
    /// Run every initialization stage
    ///
    /// `chooser` is only consulted when the configuration does not name a
    /// device.
    pub fn new(config: &AppConfig, chooser: &mut dyn DeviceChooser) -> AppResult<Self> {
        config.validate()?;

        let window = W::create(&config.title, config.width, config.height)?;

        if window.vulkan_supported() {
            log::info!("Vulkan support found");
        } else {
            let reason = "Vulkan support not found".to_string();
            return Err(VulkanError::InitializationFailed(reason).into());
        }
        let runtime = R::load()?;

        // Instance: the window dictates the required extensions, no layer is required
        let required_extensions = window
            .required_instance_extensions()
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;
        let available_extensions = runtime.available_extensions()?;
        let extensions = negotiate(
            CapabilityClass::InstanceExtension,
            &required_extensions,
            &config.requested_extensions,
            &available_extensions,
        )?;
        let available_layers = runtime.available_layers()?;
        let layers =
            negotiate(CapabilityClass::Layer, &[], &config.requested_layers, &available_layers)?;

        let instance = runtime.create_instance(&config.application_info(), &extensions, &layers)?;

        // Physical device
        let devices = runtime.physical_devices(&instance)?;
        let selection = device::select(&devices, config.device_pick(), chooser)?;
        let graphics_family = selection.require_graphics_family()?;

        // Logical device
        let device_extensions = if config.requested_device_extensions.is_empty() {
            EnabledCapabilitySet::empty(CapabilityClass::DeviceExtension)
        } else {
            let available = runtime.available_device_extensions(&instance, selection.device)?;
            negotiate(
                CapabilityClass::DeviceExtension,
                &[],
                &config.requested_device_extensions,
                &available,
            )?
        };
        let request = DeviceRequest {
            physical_device: selection.device,
            queue_family: graphics_family,
            queue_priority: GRAPHICS_QUEUE_PRIORITY,
            layers: &layers,
            extensions: &device_extensions,
        };
        let device = runtime
            .create_device(&instance, &request)
            .map_err(AppError::DeviceCreation)?;

        Ok(Self {
            enabled_extensions: extensions.to_owned_names(),
            enabled_layers: layers.to_owned_names(),
            enabled_device_extensions: device_extensions.to_owned_names(),
            device,
            instance,
            runtime,
            window,
            selection,
        })
    }

    /// Poll window events until the window is asked to close
    pub fn run(&mut self) {
        log::info!("Entering main loop");
        while !self.window.should_close() {
            self.window.poll_events();
        }
        log::info!("Window closed");
    }

    /// The selected physical device and queue family
    pub fn selection(&self) -> &SelectionResult {
        &self.selection
    }

    /// Instance extensions in the order they were enabled
    pub fn enabled_extensions(&self) -> &[String] {
        &self.enabled_extensions
    }

    /// Instance layers in the order they were enabled
    pub fn enabled_layers(&self) -> &[String] {
        &self.enabled_layers
    }

    /// Device extensions in the order they were enabled
    pub fn enabled_device_extensions(&self) -> &[String] {
        &self.enabled_device_extensions
    }

    /// The window
    pub fn window(&self) -> &W {
        &self.window
    }

    /// The graphics runtime
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// The instance
    pub fn instance(&self) -> &R::Instance {
        &self.instance
    }

    /// The logical device
    pub fn device(&self) -> &R::Device {
        &self.device
    }
}

impl VulkanApplication {
    /// Queue used for graphics submissions
    pub fn graphics_queue(&self) -> ash::vk::Queue {
        self.device.graphics_queue
    }
}

impl<W: WindowSession, R: GraphicsRuntime> Drop for Application<W, R> {
    fn drop(&mut self) {
        log::info!("Shutting down");
    }
}
