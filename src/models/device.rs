// Device resolution
//
// Turns a DevicePreference into the concrete device a model is bound to.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::DevicePreference;

/// Accelerator families the runtime can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceleratorKind {
    Cuda,
    Metal,
}

/// A specific accelerator (kind + ordinal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Accelerator {
    pub kind: AcceleratorKind,
    pub ordinal: usize,
}

impl Accelerator {
    pub fn cuda(ordinal: usize) -> Self {
        Self {
            kind: AcceleratorKind::Cuda,
            ordinal,
        }
    }

    pub fn metal(ordinal: usize) -> Self {
        Self {
            kind: AcceleratorKind::Metal,
            ordinal,
        }
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AcceleratorKind::Cuda => write!(f, "cuda:{}", self.ordinal),
            AcceleratorKind::Metal => write!(f, "metal:{}", self.ordinal),
        }
    }
}

/// Device a loaded model is bound to.
///
/// `Explicit` carries a user-supplied device string that has not been
/// validated; the runtime rejects it at deserialization if it cannot open it.
/// CPU spellings (`cpu`, `cpu:0`) never reach it, they parse to `Cpu`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConcreteDevice {
    Cpu,
    Accelerator(Accelerator),
    Explicit(String),
}

impl ConcreteDevice {
    /// Only the general-purpose processor counts as CPU; explicit strings
    /// name accelerators.
    pub fn is_cpu(&self) -> bool {
        matches!(self, ConcreteDevice::Cpu)
    }
}

impl fmt::Display for ConcreteDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcreteDevice::Cpu => f.write_str("cpu"),
            ConcreteDevice::Accelerator(acc) => write!(f, "{}", acc),
            ConcreteDevice::Explicit(name) => f.write_str(name),
        }
    }
}

/// Resolve a preference against the accelerator the runtime reports.
///
/// Pure: the same (preference, availability) pair always yields the same
/// device.
pub fn resolve_device(
    preference: &DevicePreference,
    available: Option<Accelerator>,
) -> ConcreteDevice {
    let device = match preference {
        DevicePreference::Auto | DevicePreference::Gpu => match available {
            Some(acc) => ConcreteDevice::Accelerator(acc),
            None => ConcreteDevice::Cpu,
        },
        DevicePreference::Cpu => ConcreteDevice::Cpu,
        DevicePreference::Explicit(name) => ConcreteDevice::Explicit(name.clone()),
    };
    tracing::debug!("Device preference '{}' resolved to {}", preference, device);
    device
}
