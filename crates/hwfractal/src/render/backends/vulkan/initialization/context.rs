//! Vulkan context management
//!
//! Loads the Vulkan library and owns the instance and logical device created
//! during bootstrap. Every wrapper releases its handle on drop.

use ash::extensions::ext::DebugUtils;
use ash::vk;
use ash::{Device, Entry, Instance};
use std::ffi::{c_char, CStr, CString};
use thiserror::Error;

use crate::render::backend::{ApplicationInfo, DeviceRequest, GraphicsRuntime, ENGINE_NAME};
use crate::render::capability::{AvailableCapability, EnabledCapabilitySet};
use crate::render::device::{DeviceDescriptor, DeviceFeatures, QueueFamilyDescriptor};

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// The Vulkan library could not be loaded
    #[error("Failed to load Vulkan: {0}")]
    Loading(String),

    /// A capability name cannot be passed to the runtime
    #[error("Invalid capability name: {0:?}")]
    InvalidName(String),

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Convert a fixed-size, NUL-terminated name field into a `String`
pub(crate) fn name_from_raw(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn extension_capabilities(properties: &[vk::ExtensionProperties]) -> Vec<AvailableCapability> {
    properties
        .iter()
        .map(|extension| {
            let name = name_from_raw(&extension.extension_name);
            AvailableCapability::new(name, extension.spec_version)
        })
        .collect()
}

fn to_cstrings(names: &EnabledCapabilitySet<'_>) -> VulkanResult<Vec<CString>> {
    names
        .iter()
        .map(|name| CString::new(name).map_err(|_| VulkanError::InvalidName(name.to_string())))
        .collect()
}

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Debug messenger forwarding validation output to `log`
    debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
    /// Vulkan instance handle
    pub instance: Instance,
    /// Keeps the loader alive for as long as the instance
    pub entry: Entry,
}

impl VulkanInstance {
    fn new(
        entry: &Entry,
        app: &ApplicationInfo,
        extensions: &EnabledCapabilitySet<'_>,
        layers: &EnabledCapabilitySet<'_>,
    ) -> VulkanResult<Self> {
        let app_name = CString::new(app.name.as_str())
            .map_err(|_| VulkanError::InvalidName(app.name.clone()))?;
        let engine_name = CString::new(ENGINE_NAME)
            .map_err(|_| VulkanError::InvalidName(ENGINE_NAME.to_string()))?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(app.packed_version())
            .engine_name(&engine_name)
            .engine_version(app.packed_version())
            .api_version(vk::API_VERSION_1_0);

        let extension_names = to_cstrings(extensions)?;
        let extension_ptrs: Vec<*const c_char> =
            extension_names.iter().map(|name| name.as_ptr()).collect();
        let layer_names = to_cstrings(layers)?;
        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);

        let instance = unsafe {
            entry.create_instance(&create_info, None).map_err(|e| {
                log::error!("Failed to create Vulkan instance: {:?}", e);
                VulkanError::Api(e)
            })?
        };
        log::debug!("Created instance");

        let debug_utils_name = DebugUtils::name().to_string_lossy();
        let debug = if extensions.contains(&debug_utils_name) {
            let debug_utils = DebugUtils::new(entry, &instance);
            match Self::setup_debug_messenger(&debug_utils) {
                Ok(messenger) => Some((debug_utils, messenger)),
                Err(e) => {
                    log::warn!("Debug messenger unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            debug,
            instance,
            entry: entry.clone(),
        })
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((debug_utils, messenger)) = self.debug.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        log::debug!("Destroyed instance");
    }
}

/// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Index of the graphics queue family
    pub graphics_family: u32,
}

impl LogicalDevice {
    fn new(instance: &Instance, request: &DeviceRequest<'_>) -> VulkanResult<Self> {
        let priorities = [request.queue_priority];
        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(request.queue_family)
            .queue_priorities(&priorities)
            .build()];

        let layer_names = to_cstrings(request.layers)?;
        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|name| name.as_ptr()).collect();
        let extension_names = to_cstrings(request.extensions)?;
        let extension_ptrs: Vec<*const c_char> =
            extension_names.iter().map(|name| name.as_ptr()).collect();

        let device_features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_layer_names(&layer_ptrs)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&device_features);

        let device = unsafe {
            instance
                .create_device(request.physical_device, &create_info, None)
                .map_err(|e| {
                    log::error!("Failed to create device: {:?}", e);
                    VulkanError::Api(e)
                })?
        };
        log::info!("Created logical device");

        let graphics_queue = unsafe { device.get_device_queue(request.queue_family, 0) };

        Ok(Self {
            device,
            graphics_queue,
            graphics_family: request.queue_family,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
        log::debug!("Destroyed logical device");
    }
}

/// Vulkan runtime backed by the system loader
pub struct VulkanRuntime {
    entry: Entry,
}

impl GraphicsRuntime for VulkanRuntime {
    type Instance = VulkanInstance;
    type Device = LogicalDevice;

    fn load() -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| VulkanError::Loading(e.to_string()))?;
        Ok(Self { entry })
    }

    fn available_extensions(&self) -> VulkanResult<Vec<AvailableCapability>> {
        let properties = self.entry.enumerate_instance_extension_properties(None).map_err(|e| {
            log::error!("Failed to get extensions: {:?}", e);
            VulkanError::Api(e)
        })?;

        Ok(extension_capabilities(&properties))
    }

    fn available_layers(&self) -> VulkanResult<Vec<AvailableCapability>> {
        let properties = self.entry.enumerate_instance_layer_properties().map_err(|e| {
            log::error!("Failed to get layers: {:?}", e);
            VulkanError::Api(e)
        })?;

        Ok(properties
            .iter()
            .map(|layer| AvailableCapability {
                name: name_from_raw(&layer.layer_name),
                spec_version: layer.spec_version,
                implementation_version: Some(layer.implementation_version),
                description: Some(name_from_raw(&layer.description)),
            })
            .collect())
    }

    fn create_instance(
        &self,
        app: &ApplicationInfo,
        extensions: &EnabledCapabilitySet<'_>,
        layers: &EnabledCapabilitySet<'_>,
    ) -> VulkanResult<Self::Instance> {
        VulkanInstance::new(&self.entry, app, extensions, layers)
    }

    fn physical_devices(&self, instance: &Self::Instance) -> VulkanResult<Vec<DeviceDescriptor>> {
        let instance = &instance.instance;
        let devices = unsafe {
            instance.enumerate_physical_devices().map_err(|e| {
                log::error!("Failed to get devices: {:?}", e);
                VulkanError::Api(e)
            })?
        };

        Ok(devices
            .into_iter()
            .map(|handle| {
                let properties = unsafe { instance.get_physical_device_properties(handle) };
                let features = unsafe { instance.get_physical_device_features(handle) };
                let families =
                    unsafe { instance.get_physical_device_queue_family_properties(handle) };

                DeviceDescriptor {
                    handle,
                    name: name_from_raw(&properties.device_name),
                    device_type: properties.device_type,
                    api_version: properties.api_version,
                    features: DeviceFeatures {
                        geometry_shader: features.geometry_shader == vk::TRUE,
                        shader_float64: features.shader_float64 == vk::TRUE,
                    },
                    queue_families: families
                        .iter()
                        .zip(0u32..)
                        .map(|(family, index)| QueueFamilyDescriptor {
                            index,
                            flags: family.queue_flags,
                            queue_count: family.queue_count,
                        })
                        .collect(),
                }
            })
            .collect())
    }

    fn available_device_extensions(
        &self,
        instance: &Self::Instance,
        device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<AvailableCapability>> {
        let properties = unsafe {
            instance
                .instance
                .enumerate_device_extension_properties(device)
                .map_err(VulkanError::Api)?
        };

        Ok(extension_capabilities(&properties))
    }

    fn create_device(
        &self,
        instance: &Self::Instance,
        request: &DeviceRequest<'_>,
    ) -> VulkanResult<Self::Device> {
        LogicalDevice::new(&instance.instance, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_name(name: &str) -> [c_char; 256] {
        let mut raw = [0 as c_char; 256];
        for (slot, byte) in raw.iter_mut().zip(name.bytes()) {
            *slot = byte as c_char;
        }
        raw
    }

    #[test]
    fn test_name_from_raw_stops_at_nul() {
        let name = "VK_LAYER_KHRONOS_validation";
        assert_eq!(name_from_raw(&raw_name(name)), name);
        assert_eq!(name_from_raw(&raw_name("")), "");
    }

    #[test]
    fn test_name_from_raw_without_terminator() {
        let raw = [b'a' as c_char, b'b' as c_char];
        assert_eq!(name_from_raw(&raw), "ab");
    }

    #[test]
    fn test_interior_nul_is_rejected() {
        let names = vec!["bad\0name".to_string()];
        let enabled = crate::render::capability::negotiate(
            crate::render::capability::CapabilityClass::Layer,
            &[],
            &names,
            &[AvailableCapability::new("bad\0name", 1)],
        )
        .unwrap();

        assert!(matches!(to_cstrings(&enabled), Err(VulkanError::InvalidName(_))));
    }
}
