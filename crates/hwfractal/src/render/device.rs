//! Physical device description and selection
//!
//! Devices are described once from runtime queries into plain
//! [`DeviceDescriptor`] values, then selected either by an explicit index or by
//! asking a [`DeviceChooser`]. Suitability is reported for every device but
//! never used to exclude one: the operator may pick any enumerated device.

use ash::vk;
use bitflags::bitflags;
use std::io::{BufRead, Write};
use thiserror::Error;

bitflags! {
    /// Advisory suitability signals for a device
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceSuitability: u32 {
        /// Supports geometry shaders
        const GEOMETRY_SHADER = 1;
        /// Supports 64-bit floats in shaders
        const SHADER_FLOAT64 = 1 << 1;
        /// Has at least one graphics-capable queue family
        const GRAPHICS_QUEUE = 1 << 2;
    }
}

/// Device selection errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// The runtime reported no physical devices
    #[error("No device found")]
    NoDevices,

    /// Explicit index outside `0..count`
    #[error("Device selected is invalid: {index} (found {count} device(s))")]
    InvalidIndex {
        /// Index that was asked for
        index: i64,
        /// Number of enumerated devices
        count: usize,
    },

    /// The chooser gave up without a valid answer
    #[error("Device selection was cancelled")]
    Cancelled,

    /// The selected device has no graphics-capable queue family
    #[error("Device {device} has no graphics queue family")]
    NoGraphicsQueue {
        /// Name of the selected device
        device: String,
    },
}

/// Result type for device selection
pub type DeviceResult<T> = Result<T, SelectionError>;

/// Feature bits relevant to device evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceFeatures {
    /// Geometry shader support
    pub geometry_shader: bool,
    /// 64-bit float support in shaders
    pub shader_float64: bool,
}

/// One queue family of a physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyDescriptor {
    /// Family index as used by the runtime
    pub index: u32,
    /// Operations supported by the family
    pub flags: vk::QueueFlags,
    /// Number of queues in the family
    pub queue_count: u32,
}

impl QueueFamilyDescriptor {
    /// Whether this family accepts graphics work
    pub fn supports_graphics(&self) -> bool {
        self.flags.contains(vk::QueueFlags::GRAPHICS)
    }
}

/// Static description of a physical device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    /// Runtime handle for the device
    pub handle: vk::PhysicalDevice,
    /// Device name
    pub name: String,
    /// Device type (discrete, integrated, ...)
    pub device_type: vk::PhysicalDeviceType,
    /// Highest API version the device supports
    pub api_version: u32,
    /// Evaluated features
    pub features: DeviceFeatures,
    /// Queue families in runtime order
    pub queue_families: Vec<QueueFamilyDescriptor>,
}

impl DeviceDescriptor {
    /// Suitability signals for this device
    pub fn suitability(&self) -> DeviceSuitability {
        let mut suitability = DeviceSuitability::empty();
        suitability.set(DeviceSuitability::GEOMETRY_SHADER, self.features.geometry_shader);
        suitability.set(DeviceSuitability::SHADER_FLOAT64, self.features.shader_float64);
        suitability.set(DeviceSuitability::GRAPHICS_QUEUE, self.graphics_family().is_some());
        suitability
    }

    /// First queue family that supports graphics
    pub fn graphics_family(&self) -> Option<u32> {
        self.queue_families
            .iter()
            .find(|family| family.supports_graphics())
            .map(|family| family.index)
    }
}

/// How the device should be picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePick {
    /// Ask a [`DeviceChooser`]
    Interactive,
    /// Use this index
    Index(i64),
}

impl DevicePick {
    /// Decode the config value where `-1` means interactive
    pub fn from_config(value: i64) -> Self {
        if value == -1 {
            Self::Interactive
        } else {
            Self::Index(value)
        }
    }
}

/// Outcome of a successful selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    /// Index into the enumerated device list
    pub index: usize,
    /// Selected physical device
    pub device: vk::PhysicalDevice,
    /// Name of the selected device
    pub name: String,
    /// First graphics-capable queue family, if any
    pub graphics_family: Option<u32>,
}

impl SelectionResult {
    /// The graphics family, or an error when the device has none
    pub fn require_graphics_family(&self) -> DeviceResult<u32> {
        self.graphics_family.ok_or_else(|| SelectionError::NoGraphicsQueue {
            device: self.name.clone(),
        })
    }
}

/// Source of a device index when none is configured
pub trait DeviceChooser {
    /// Return an index into `devices`, or `None` to cancel selection
    ///
    /// Out-of-range answers are rejected by the caller, which then asks again.
    fn choose(&mut self, devices: &[DeviceDescriptor]) -> Option<usize>;
}

/// Blocking prompt on a text stream
pub struct ConsoleChooser<R, W> {
    input: R,
    output: W,
}

impl ConsoleChooser<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompt on standard output and read from standard input
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleChooser<R, W> {
    /// Prompt on `output` and read answers from `input`
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> DeviceChooser for ConsoleChooser<R, W> {
    fn choose(&mut self, devices: &[DeviceDescriptor]) -> Option<usize> {
        let last = devices.len().saturating_sub(1);
        loop {
            if let Err(e) = write!(self.output, "Please select a device (0-{}): ", last)
                .and_then(|()| self.output.flush())
            {
                log::error!("Failed to write device prompt: {}", e);
                return None;
            }

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                // End of input: nobody is left to answer
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    log::error!("Failed to read device selection: {}", e);
                    return None;
                }
            }

            match line.trim().parse::<usize>() {
                Ok(index) => return Some(index),
                Err(_) => log::warn!("Not a device index: {:?}", line.trim()),
            }
        }
    }
}

/// Non-interactive chooser preferring fully suitable devices
///
/// Picks the first device that has every suitability signal, falling back to
/// the first device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuitabilityChooser;

impl DeviceChooser for SuitabilityChooser {
    fn choose(&mut self, devices: &[DeviceDescriptor]) -> Option<usize> {
        devices
            .iter()
            .position(|device| device.suitability().is_all())
            .or_else(|| (!devices.is_empty()).then_some(0))
    }
}

fn device_type_name(device_type: vk::PhysicalDeviceType) -> &'static str {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => "discrete GPU",
        vk::PhysicalDeviceType::INTEGRATED_GPU => "integrated GPU",
        vk::PhysicalDeviceType::VIRTUAL_GPU => "virtual GPU",
        vk::PhysicalDeviceType::CPU => "CPU",
        _ => "other",
    }
}

fn report_device(index: usize, device: &DeviceDescriptor) {
    let suitability = device.suitability();
    log::info!(
        "{}    {} ({}, Vulkan {}.{}.{})",
        index,
        device.name,
        device_type_name(device.device_type),
        vk::api_version_major(device.api_version),
        vk::api_version_minor(device.api_version),
        vk::api_version_patch(device.api_version),
    );

    if suitability.contains(DeviceSuitability::GEOMETRY_SHADER) {
        log::info!("        Supports geometry shader");
    } else {
        log::warn!("        No geometry shader support");
    }
    if suitability.contains(DeviceSuitability::SHADER_FLOAT64) {
        log::info!("        Supports 64 bit float, will have better precision");
    } else {
        log::warn!("        No 64 bit float support, precision will be degraded");
    }
    if suitability.contains(DeviceSuitability::GRAPHICS_QUEUE) {
        log::info!("        Graphics queue detected");
    } else {
        log::warn!("        No graphics queue detected");
    }
}

fn checked_index(index: i64, count: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&index| index < count)
}

/// Select a device from `devices`
///
/// An explicit pick must be in range. An interactive pick asks `chooser` until
/// it answers with a valid index or cancels.
pub fn select(
    devices: &[DeviceDescriptor],
    pick: DevicePick,
    chooser: &mut dyn DeviceChooser,
) -> DeviceResult<SelectionResult> {
    if devices.is_empty() {
        log::error!("No device found");
        return Err(SelectionError::NoDevices);
    }

    log::debug!("Found {} device(s)", devices.len());
    log::info!("Devices:");
    for (index, device) in devices.iter().enumerate() {
        report_device(index, device);
    }

    let index = match pick {
        DevicePick::Index(index) => checked_index(index, devices.len()).ok_or_else(|| {
            log::error!("Device selected is invalid: {}", index);
            SelectionError::InvalidIndex {
                index,
                count: devices.len(),
            }
        })?,
        DevicePick::Interactive => loop {
            let answer = chooser.choose(devices).ok_or(SelectionError::Cancelled)?;
            if answer < devices.len() {
                break answer;
            }
            log::warn!("Device selected is invalid: {}", answer);
        },
    };

    let device = &devices[index];
    let graphics_family = device.graphics_family();
    log::info!("Selected device {}", index);
    match graphics_family {
        Some(family) => log::debug!("Graphics family is {}", family),
        None => log::warn!("Selected device has no graphics queue family"),
    }

    Ok(SelectionResult {
        index,
        device: device.handle,
        name: device.name.clone(),
        graphics_family,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;
    use std::collections::VecDeque;
    use std::io::Cursor;

    struct ScriptedChooser {
        answers: VecDeque<usize>,
        asked: usize,
    }

    impl ScriptedChooser {
        fn new(answers: &[usize]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: 0,
            }
        }
    }

    impl DeviceChooser for ScriptedChooser {
        fn choose(&mut self, _devices: &[DeviceDescriptor]) -> Option<usize> {
            self.asked += 1;
            self.answers.pop_front()
        }
    }

    fn family(index: u32, flags: vk::QueueFlags) -> QueueFamilyDescriptor {
        QueueFamilyDescriptor {
            index,
            flags,
            queue_count: 1,
        }
    }

    fn device(id: u64, families: Vec<QueueFamilyDescriptor>) -> DeviceDescriptor {
        DeviceDescriptor {
            handle: vk::PhysicalDevice::from_raw(id),
            name: format!("GPU {}", id),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            api_version: vk::API_VERSION_1_0,
            features: DeviceFeatures {
                geometry_shader: true,
                shader_float64: true,
            },
            queue_families: families,
        }
    }

    fn graphics_device(id: u64) -> DeviceDescriptor {
        device(id, vec![family(0, vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)])
    }

    #[test]
    fn test_no_devices_fails_for_any_pick() {
        let mut chooser = ScriptedChooser::new(&[0]);
        for pick in [DevicePick::Interactive, DevicePick::Index(0), DevicePick::Index(3)] {
            assert_eq!(select(&[], pick, &mut chooser), Err(SelectionError::NoDevices));
        }
        assert_eq!(chooser.asked, 0);
    }

    #[test]
    fn test_out_of_range_pick_fails() {
        let devices = vec![graphics_device(1), graphics_device(2), graphics_device(3)];
        let mut chooser = ScriptedChooser::new(&[]);

        let result = select(&devices, DevicePick::Index(5), &mut chooser);
        assert_eq!(result, Err(SelectionError::InvalidIndex { index: 5, count: 3 }));

        let result = select(&devices, DevicePick::Index(-2), &mut chooser);
        assert_eq!(result, Err(SelectionError::InvalidIndex { index: -2, count: 3 }));
    }

    #[test]
    fn test_explicit_pick() {
        let devices = vec![graphics_device(1), graphics_device(2)];
        let mut chooser = ScriptedChooser::new(&[]);

        let selected = select(&devices, DevicePick::Index(1), &mut chooser).unwrap();

        assert_eq!(selected.index, 1);
        assert_eq!(selected.device, vk::PhysicalDevice::from_raw(2));
        assert_eq!(selected.graphics_family, Some(0));
        assert_eq!(chooser.asked, 0);
    }

    #[test]
    fn test_interactive_pick_reasks_until_valid() {
        let devices = vec![graphics_device(1), graphics_device(2)];
        let mut chooser = ScriptedChooser::new(&[7, 2, 1]);

        let selected = select(&devices, DevicePick::Interactive, &mut chooser).unwrap();

        assert_eq!(selected.index, 1);
        assert_eq!(chooser.asked, 3);
    }

    #[test]
    fn test_interactive_pick_can_be_cancelled() {
        let devices = vec![graphics_device(1)];
        let mut chooser = ScriptedChooser::new(&[4]);

        let result = select(&devices, DevicePick::Interactive, &mut chooser);

        assert_eq!(result, Err(SelectionError::Cancelled));
    }

    #[test]
    fn test_device_without_graphics_family_is_still_selectable() {
        let mut compute_only = device(9, vec![family(0, vk::QueueFlags::COMPUTE)]);
        compute_only.features = DeviceFeatures::default();
        let mut chooser = ScriptedChooser::new(&[]);

        let selected = select(&[compute_only], DevicePick::Index(0), &mut chooser).unwrap();

        assert_eq!(selected.graphics_family, None);
        assert_eq!(
            selected.require_graphics_family(),
            Err(SelectionError::NoGraphicsQueue { device: "GPU 9".to_string() })
        );
    }

    #[test]
    fn test_first_graphics_family_wins() {
        let devices = vec![device(
            1,
            vec![
                family(0, vk::QueueFlags::TRANSFER),
                family(1, vk::QueueFlags::GRAPHICS),
                family(2, vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            ],
        )];
        let mut chooser = ScriptedChooser::new(&[]);

        let selected = select(&devices, DevicePick::Index(0), &mut chooser).unwrap();

        assert_eq!(selected.graphics_family, Some(1));
    }

    #[test]
    fn test_suitability_flags() {
        let mut gpu = graphics_device(1);
        assert!(gpu.suitability().is_all());

        gpu.features.shader_float64 = false;
        gpu.queue_families = vec![family(0, vk::QueueFlags::COMPUTE)];
        assert_eq!(gpu.suitability(), DeviceSuitability::GEOMETRY_SHADER);
    }

    #[test]
    fn test_pick_from_config() {
        assert_eq!(DevicePick::from_config(-1), DevicePick::Interactive);
        assert_eq!(DevicePick::from_config(0), DevicePick::Index(0));
        assert_eq!(DevicePick::from_config(-3), DevicePick::Index(-3));
    }

    #[test]
    fn test_console_chooser_skips_garbage() {
        let devices = vec![graphics_device(1), graphics_device(2)];
        let mut output = Vec::new();
        let mut chooser = ConsoleChooser::new(Cursor::new("abc\n\n 1 \n"), &mut output);

        assert_eq!(chooser.choose(&devices), Some(1));
        drop(chooser);

        let prompt = String::from_utf8(output).unwrap();
        assert_eq!(prompt.matches("Please select a device (0-1)").count(), 3);
    }

    #[test]
    fn test_console_chooser_cancels_on_eof() {
        let devices = vec![graphics_device(1)];
        let mut chooser = ConsoleChooser::new(Cursor::new(""), Vec::new());

        assert_eq!(chooser.choose(&devices), None);
    }

    #[test]
    fn test_suitability_chooser_prefers_suitable_device() {
        let mut weak = graphics_device(1);
        weak.features.geometry_shader = false;
        let devices = vec![weak.clone(), graphics_device(2)];

        assert_eq!(SuitabilityChooser.choose(&devices), Some(1));
        assert_eq!(SuitabilityChooser.choose(&[weak]), Some(0));
        assert_eq!(SuitabilityChooser.choose(&[]), None);
    }
}
