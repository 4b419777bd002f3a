//! Capability negotiation
//!
//! Intersects the capabilities an application asks for with the ones the
//! graphics runtime actually exposes. The same routine serves every capability
//! class (instance extensions, instance layers and device extensions).
//!
//! Required names are all-or-nothing: a single missing one aborts
//! initialization. Requested names are best effort and only produce a warning.

use std::fmt;
use thiserror::Error;

/// Kind of capability being negotiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityClass {
    /// Instance-level extension
    InstanceExtension,
    /// Instance layer
    Layer,
    /// Device-level extension
    DeviceExtension,
}

impl fmt::Display for CapabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InstanceExtension => "extensions",
            Self::Layer => "layers",
            Self::DeviceExtension => "device extensions",
        };
        f.write_str(name)
    }
}

/// Capability negotiation errors
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// One or more required capabilities are not offered by the runtime
    #[error("Found {found} of {required} required {class}, missing: {}", missing.join(", "))]
    MissingRequired {
        /// Class that failed to negotiate
        class: CapabilityClass,
        /// Number of required names that were found
        found: usize,
        /// Number of required names
        required: usize,
        /// Required names that were not available
        missing: Vec<String>,
    },
}

/// Result type for capability negotiation
pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// A capability reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableCapability {
    /// Capability name as reported by the runtime
    pub name: String,
    /// Specification version the capability implements
    pub spec_version: u32,
    /// Implementation version (layers only)
    pub implementation_version: Option<u32>,
    /// Human readable description (layers only)
    pub description: Option<String>,
}

impl AvailableCapability {
    /// Create a capability entry with only a name and spec version
    pub fn new(name: impl Into<String>, spec_version: u32) -> Self {
        Self {
            name: name.into(),
            spec_version,
            implementation_version: None,
            description: None,
        }
    }
}

/// Required and requested names for one capability class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRequest {
    /// Class the names belong to
    pub class: CapabilityClass,
    /// Names that must all be present
    pub required: Vec<String>,
    /// Names enabled only when present
    pub requested: Vec<String>,
}

impl CapabilityRequest {
    /// Create an empty request for a class
    pub fn new(class: CapabilityClass) -> Self {
        Self {
            class,
            required: Vec::new(),
            requested: Vec::new(),
        }
    }

    /// Set the required names
    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the requested names
    pub fn with_requested<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested = names.into_iter().map(Into::into).collect();
        self
    }

    /// Negotiate this request against what the runtime offers
    pub fn negotiate(
        &self,
        available: &[AvailableCapability],
    ) -> CapabilityResult<EnabledCapabilitySet<'_>> {
        negotiate(self.class, &self.required, &self.requested, available)
    }
}

/// Capabilities that will be enabled, borrowed from the originating request
///
/// Required matches come first, then requested matches, each in request order.
/// The order is handed to the runtime unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledCapabilitySet<'a> {
    class: CapabilityClass,
    names: Vec<&'a str>,
    missing_requested: Vec<&'a str>,
}

impl<'a> EnabledCapabilitySet<'a> {
    /// An empty set, used when nothing needs to be enabled
    pub fn empty(class: CapabilityClass) -> Self {
        Self {
            class,
            names: Vec::new(),
            missing_requested: Vec::new(),
        }
    }

    /// Class of the enabled capabilities
    pub fn class(&self) -> CapabilityClass {
        self.class
    }

    /// Enabled names in submission order
    pub fn names(&self) -> &[&'a str] {
        &self.names
    }

    /// Requested names the runtime did not offer
    pub fn missing_requested(&self) -> &[&'a str] {
        &self.missing_requested
    }

    /// Number of enabled capabilities
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is enabled
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `name` is enabled
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|enabled| *enabled == name)
    }

    /// Iterate over the enabled names
    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.names.iter().copied()
    }

    /// Copy the names out so they can outlive the request
    pub fn to_owned_names(&self) -> Vec<String> {
        self.names.iter().map(|name| (*name).to_string()).collect()
    }
}

fn is_available(name: &str, available: &[AvailableCapability]) -> bool {
    available.iter().any(|capability| capability.name == name)
}

fn log_names<'n>(heading: &str, class: CapabilityClass, names: impl Iterator<Item = &'n str>) {
    log::debug!("{} {}:", heading, class);
    for name in names {
        log::debug!("    {}", name);
    }
}

/// Negotiate one capability class
///
/// Fails when any `required` name is absent from `available`. Requested names
/// that are absent are skipped and reported through
/// [`EnabledCapabilitySet::missing_requested`].
pub fn negotiate<'a>(
    class: CapabilityClass,
    required: &'a [String],
    requested: &'a [String],
    available: &[AvailableCapability],
) -> CapabilityResult<EnabledCapabilitySet<'a>> {
    log_names("Required", class, required.iter().map(String::as_str));
    log_names("Requested", class, requested.iter().map(String::as_str));
    log_names("Available", class, available.iter().map(|capability| capability.name.as_str()));

    let (found_required, missing_required): (Vec<&'a str>, Vec<&'a str>) = required
        .iter()
        .map(String::as_str)
        .partition(|name| is_available(name, available));

    if missing_required.is_empty() {
        log::info!("Found {} of {} required {}", found_required.len(), required.len(), class);
    } else {
        log::error!("Found {} of {} required {}", found_required.len(), required.len(), class);
        return Err(CapabilityError::MissingRequired {
            class,
            found: found_required.len(),
            required: required.len(),
            missing: missing_required.iter().map(|name| (*name).to_string()).collect(),
        });
    }

    let (found_requested, missing_requested): (Vec<&'a str>, Vec<&'a str>) = requested
        .iter()
        .map(String::as_str)
        .partition(|name| is_available(name, available));

    if missing_requested.is_empty() {
        log::info!("Found {} of {} requested {}", found_requested.len(), requested.len(), class);
    } else {
        log::warn!(
            "Found {} of {} requested {}, missing: {}",
            found_requested.len(),
            requested.len(),
            class,
            missing_requested.join(", ")
        );
    }

    let mut names = found_required;
    names.extend(found_requested);
    log_names("Enabled", class, names.iter().copied());

    Ok(EnabledCapabilitySet {
        class,
        names,
        missing_requested,
    })
}
