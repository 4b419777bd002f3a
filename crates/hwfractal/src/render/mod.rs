//! # Rendering bootstrap
//!
//! Everything between "open a window" and "hold a logical device with a
//! graphics queue":
//! - **Window**: the [`WindowSession`] trait and its GLFW implementation
//! - **Capability negotiation**: required/requested extension and layer lists
//!   intersected with what the runtime offers
//! - **Device selection**: device descriptors, advisory suitability and the
//!   [`DeviceChooser`] used when no device is configured
//! - **Backend**: the [`GraphicsRuntime`] trait and its Vulkan implementation

pub mod window;
pub mod backend;
pub mod capability;
pub mod device;

/// Graphics backend implementations
pub mod backends;

pub use backend::{ApplicationInfo, DeviceRequest, GraphicsRuntime, ENGINE_NAME};
pub use capability::{
    negotiate, AvailableCapability, CapabilityClass, CapabilityError, CapabilityRequest,
    EnabledCapabilitySet,
};
pub use device::{
    select, ConsoleChooser, DeviceChooser, DeviceDescriptor, DeviceFeatures, DevicePick,
    DeviceSuitability, QueueFamilyDescriptor, SelectionError, SelectionResult, SuitabilityChooser,
};
pub use window::{WindowError, WindowSession};
