//! Foundation module - Core utilities
//!
//! - Logging setup

pub mod logging;
