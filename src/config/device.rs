// Device preference - what the user asked for, before resolution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested compute device.
///
/// `Auto` and `Gpu` pick the best accelerator the runtime reports and fall
/// back to the CPU; `Explicit` is passed to the runtime untouched. `cpu:0`
/// names the only CPU device and parses to `Cpu`.
///
/// Serializes as a plain string, e.g. `device = "cuda:1"` in config.toml.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Gpu,
    Explicit(String),
}

impl DevicePreference {
    /// Whether this preference asks for accelerator detection
    pub fn wants_accelerator(&self) -> bool {
        matches!(self, DevicePreference::Auto | DevicePreference::Gpu)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DevicePreference::Auto => "auto",
            DevicePreference::Cpu => "cpu",
            DevicePreference::Gpu => "gpu",
            DevicePreference::Explicit(name) => name,
        }
    }
}

impl From<&str> for DevicePreference {
    fn from(value: &str) -> Self {
        match value {
            "auto" => DevicePreference::Auto,
            "cpu" | "cpu:0" => DevicePreference::Cpu,
            "gpu" => DevicePreference::Gpu,
            other => DevicePreference::Explicit(other.to_string()),
        }
    }
}

impl From<String> for DevicePreference {
    fn from(value: String) -> Self {
        DevicePreference::from(value.as_str())
    }
}

impl From<DevicePreference> for String {
    fn from(value: DevicePreference) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for DevicePreference {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DevicePreference::from(s))
    }
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_parse_to_variants() {
        assert_eq!(DevicePreference::from("auto"), DevicePreference::Auto);
        assert_eq!(DevicePreference::from("cpu"), DevicePreference::Cpu);
        assert_eq!(DevicePreference::from("gpu"), DevicePreference::Gpu);
    }

    #[test]
    fn test_cpu_ordinal_zero_is_cpu() {
        assert_eq!(DevicePreference::from("cpu:0"), DevicePreference::Cpu);
        assert_eq!("cpu:0".parse::<DevicePreference>().unwrap(), DevicePreference::Cpu);
        // There is no second CPU; the runtime rejects this one
        assert_eq!(
            DevicePreference::from("cpu:1"),
            DevicePreference::Explicit("cpu:1".to_string())
        );
    }

    #[test]
    fn test_other_strings_are_explicit() {
        assert_eq!(
            DevicePreference::from("cuda:1"),
            DevicePreference::Explicit("cuda:1".to_string())
        );
        // Sentinels are case sensitive, like the runtime's device names
        assert_eq!(
            DevicePreference::from("CPU"),
            DevicePreference::Explicit("CPU".to_string())
        );
    }

    #[test]
    fn test_wants_accelerator() {
        assert!(DevicePreference::Auto.wants_accelerator());
        assert!(DevicePreference::Gpu.wants_accelerator());
        assert!(!DevicePreference::Cpu.wants_accelerator());
        assert!(!DevicePreference::Explicit("cuda:0".into()).wants_accelerator());
    }

    #[test]
    fn test_toml_string_form() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            device: DevicePreference,
        }

        let parsed: Wrapper = toml::from_str("device = \"metal:0\"").unwrap();
        assert_eq!(parsed.device, DevicePreference::Explicit("metal:0".into()));

        let written = toml::to_string(&Wrapper {
            device: DevicePreference::Gpu,
        })
        .unwrap();
        assert_eq!(written.trim(), "device = \"gpu\"");
    }
}
