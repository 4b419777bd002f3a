//! # hwfractal
//!
//! Window and Vulkan bootstrap for the hwfractal renderer.
//!
//! ## Features
//!
//! - **Window**: GLFW window without a client API
//! - **Capability negotiation**: required and requested extensions/layers
//!   intersected with what the loader offers
//! - **Device selection**: explicit index or an injectable chooser, with an
//!   advisory suitability report for every device
//! - **Logical device**: single graphics queue on the selected device
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hwfractal::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let mut app = VulkanApplication::new(&config, &mut ConsoleChooser::stdio())?;
//!     app.run();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod foundation;
pub mod render;

mod application;

pub use application::{AppError, AppResult, Application, VulkanApplication};

/// Common imports for users of the crate
pub mod prelude {
    pub use crate::{
        config::{AppConfig, Config, ConfigError},
        render::{
            ConsoleChooser, DeviceChooser, DevicePick, GraphicsRuntime, SelectionResult,
            SuitabilityChooser, WindowSession,
        },
        AppError, AppResult, Application, VulkanApplication,
    };
}
