//! Graphics runtime abstraction
//!
//! The bootstrap sequence talks to the graphics runtime through
//! [`GraphicsRuntime`]. The Vulkan implementation lives in
//! `backends::vulkan`; tests drive the sequence with in-memory runtimes.

use crate::render::backends::vulkan::VulkanResult;
use crate::render::capability::{AvailableCapability, EnabledCapabilitySet};
use crate::render::device::DeviceDescriptor;
use ash::vk;

/// Engine name reported to the runtime
pub const ENGINE_NAME: &str = "No Engine";

/// Application metadata passed to instance creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
    /// Application name
    pub name: String,
    /// Application version (major, minor, patch), also used as engine version
    pub version: (u32, u32, u32),
}

impl ApplicationInfo {
    /// Version packed the way the runtime expects it
    pub fn packed_version(&self) -> u32 {
        let (major, minor, patch) = self.version;
        vk::make_api_version(0, major, minor, patch)
    }
}

/// Everything needed to create the logical device
#[derive(Debug, Clone, Copy)]
pub struct DeviceRequest<'a> {
    /// Selected physical device
    pub physical_device: vk::PhysicalDevice,
    /// Family the single graphics queue is taken from
    pub queue_family: u32,
    /// Priority of that queue
    pub queue_priority: f32,
    /// Layers enabled on the instance
    pub layers: &'a EnabledCapabilitySet<'a>,
    /// Device extensions to enable
    pub extensions: &'a EnabledCapabilitySet<'a>,
}

/// Graphics runtime used by the bootstrap sequence
///
/// Instances and devices release their native resources when dropped. A
/// device must be dropped before the instance it was created from.
pub trait GraphicsRuntime: Sized {
    /// Owned instance handle
    type Instance;
    /// Owned logical device handle
    type Device;

    /// Load the runtime
    fn load() -> VulkanResult<Self>;

    /// Instance extensions the runtime offers
    fn available_extensions(&self) -> VulkanResult<Vec<AvailableCapability>>;

    /// Instance layers the runtime offers
    fn available_layers(&self) -> VulkanResult<Vec<AvailableCapability>>;

    /// Create the instance with exactly the given extensions and layers
    fn create_instance(
        &self,
        app: &ApplicationInfo,
        extensions: &EnabledCapabilitySet<'_>,
        layers: &EnabledCapabilitySet<'_>,
    ) -> VulkanResult<Self::Instance>;

    /// Describe every physical device visible to the instance
    fn physical_devices(&self, instance: &Self::Instance) -> VulkanResult<Vec<DeviceDescriptor>>;

    /// Device extensions offered by a physical device
    fn available_device_extensions(
        &self,
        instance: &Self::Instance,
        device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<AvailableCapability>>;

    /// Create the logical device
    fn create_device(
        &self,
        instance: &Self::Instance,
        request: &DeviceRequest<'_>,
    ) -> VulkanResult<Self::Device>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_version() {
        let app = ApplicationInfo {
            name: "hwfractal".to_string(),
            version: (1, 2, 3),
        };
        let packed = app.packed_version();
        assert_eq!(vk::api_version_major(packed), 1);
        assert_eq!(vk::api_version_minor(packed), 2);
        assert_eq!(vk::api_version_patch(packed), 3);
    }
}
