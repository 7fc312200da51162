// Configuration structs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::*;
use super::device::DevicePreference;
use crate::errors;
use crate::models::catalog::{CatalogEntry, WeightCatalog};
use crate::models::download::CatalogDownloader;
use crate::models::loader::LoaderConfig;
use crate::models::weights::{WeightFormat, WeightLayout, DEFAULT_ACCELERATOR_SUFFIX};

fn default_true() -> bool {
    true
}

fn default_accelerator_suffix() -> String {
    DEFAULT_ACCELERATOR_SUFFIX.to_string()
}

/// `~/.cvu/weights`, or `.cvu/weights` relative to the working directory
/// when there is no home directory.
pub fn default_weights_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(CONFIG_DIR_NAME)
        .join(WEIGHTS_DIR_NAME)
}

/// Contents of ~/.cvu/config.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory symbolic weight names resolve into
    #[serde(default = "default_weights_dir")]
    pub weights_dir: PathBuf,

    /// Default device preference (default: auto)
    #[serde(default)]
    pub device: DevicePreference,

    /// Weight format to resolve and download (default: torch)
    #[serde(default)]
    pub format: WeightFormat,

    /// Suffix marking accelerator builds, e.g. swin_b.cuda.pth
    #[serde(default = "default_accelerator_suffix")]
    pub accelerator_suffix: String,

    /// Run models in f16 on non-CPU devices.
    /// ⚠️  Not validated for every model; disable if outputs look wrong.
    #[serde(default = "default_true")]
    pub half_precision_on_accelerator: bool,

    /// Show download progress bars
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// HuggingFace API token for Hub downloads (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huggingface_token: Option<String>,

    /// HuggingFace cache location (default: ~/.cache/huggingface/)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_cache_dir: Option<PathBuf>,

    /// HuggingFace Hub endpoint (default: https://huggingface.co)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_endpoint: Option<String>,

    /// Enable debug logging for troubleshooting
    #[serde(default)]
    pub debug_logging: bool,

    /// Where each symbolic weight is downloaded from
    #[serde(default, rename = "weights")]
    pub catalog: Vec<CatalogEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weights_dir: default_weights_dir(),
            device: DevicePreference::Auto,
            format: WeightFormat::Torch,
            accelerator_suffix: default_accelerator_suffix(),
            half_precision_on_accelerator: true,
            show_progress: true,
            huggingface_token: None,
            hub_cache_dir: None,
            hub_endpoint: None,
            debug_logging: false,
            catalog: Vec::new(),
        }
    }
}

impl Config {
    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> anyhow::Result<()> {
        let suffix = self.accelerator_suffix.trim();
        if suffix.is_empty() {
            anyhow::bail!(errors::wrap_error_with_suggestion(
                "accelerator_suffix must not be empty",
                "Use the default:\n  accelerator_suffix = \"cuda\""
            ));
        }

        if suffix.contains('/') || suffix.contains('\\') || suffix.contains('.') {
            anyhow::bail!(errors::wrap_error_with_suggestion(
                format!("Invalid accelerator_suffix: '{}'", self.accelerator_suffix),
                "The suffix is a single file-name component without dots\n\
                 Example: accelerator_suffix = \"cuda\""
            ));
        }

        if self.weights_dir.as_os_str().is_empty() {
            anyhow::bail!("weights_dir must not be empty");
        }

        if let Some(ref token) = self.huggingface_token {
            if token.trim().is_empty() {
                anyhow::bail!("huggingface_token is set but empty; remove it or set a token");
            }
        }

        if let Some(ref endpoint) = self.hub_endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                anyhow::bail!(errors::wrap_error_with_suggestion(
                    format!("Invalid hub_endpoint: '{}'", endpoint),
                    "Use a full URL, e.g.:\n  hub_endpoint = \"https://huggingface.co\""
                ));
            }
        }

        self.weight_catalog().validate()?;

        Ok(())
    }

    /// Apply environment overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty(ENV_WEIGHTS_DIR) {
            self.weights_dir = PathBuf::from(dir);
        }
        if let Some(device) = non_empty(ENV_DEVICE) {
            self.device = DevicePreference::from(device.trim());
        }
        if self.huggingface_token.is_none() {
            self.huggingface_token = non_empty(ENV_HF_TOKEN);
        }
        if self.hub_endpoint.is_none() {
            self.hub_endpoint = non_empty(ENV_HF_ENDPOINT);
        }
    }

    pub fn weight_catalog(&self) -> WeightCatalog {
        WeightCatalog::new(self.catalog.clone())
    }

    /// Settings consumed by `ModelLoader`
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            layout: WeightLayout {
                weights_dir: self.weights_dir.clone(),
                format: self.format,
                accelerator_suffix: self.accelerator_suffix.trim().to_string(),
            },
            half_precision_on_accelerator: self.half_precision_on_accelerator,
        }
    }

    /// Catalog downloader honoring the Hub and progress settings
    pub fn downloader(&self) -> CatalogDownloader {
        CatalogDownloader::new(self.weight_catalog())
            .with_hub_token(self.huggingface_token.clone())
            .with_hub_cache_dir(self.hub_cache_dir.clone())
            .with_hub_endpoint(self.hub_endpoint.clone())
            .with_progress(self.show_progress)
    }

    /// Save configuration as TOML
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string).with_context(|| format!("Failed to write {:?}", path))?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_settings() {
        let config = Config::default();
        assert_eq!(config.device, DevicePreference::Auto);
        assert_eq!(config.format, WeightFormat::Torch);
        assert_eq!(config.accelerator_suffix, "cuda");
        assert!(config.half_precision_on_accelerator);
        assert!(config.weights_dir.ends_with(".cvu/weights"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_WEIGHTS_DIR, "/data/weights"),
            (ENV_DEVICE, "cuda:1"),
            (ENV_HF_TOKEN, "hf_abc"),
            (ENV_HF_ENDPOINT, "https://hf-mirror.example"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.weights_dir, PathBuf::from("/data/weights"));
        assert_eq!(config.device, DevicePreference::Explicit("cuda:1".into()));
        assert_eq!(config.huggingface_token.as_deref(), Some("hf_abc"));
        assert_eq!(config.hub_endpoint.as_deref(), Some("https://hf-mirror.example"));
    }

    #[test]
    fn test_validate_rejects_relative_hub_endpoint() {
        let config = Config {
            hub_endpoint: Some("hf-mirror.example".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_token_does_not_override_file_token() {
        let mut config = Config {
            huggingface_token: Some("hf_file".to_string()),
            ..Config::default()
        };
        config.apply_env_overrides(|k| (k == ENV_HF_TOKEN).then(|| "hf_env".to_string()));
        assert_eq!(config.huggingface_token.as_deref(), Some("hf_file"));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_bad_suffix() {
        for suffix in ["", "  ", "cu/da", "cuda.fp16"] {
            let config = Config {
                accelerator_suffix: suffix.to_string(),
                ..Config::default()
            };
            assert!(config.validate().is_err(), "suffix {:?}", suffix);
        }
    }

    #[test]
    fn test_loader_config_projection() {
        let config = Config {
            weights_dir: PathBuf::from("/w"),
            format: WeightFormat::Safetensors,
            half_precision_on_accelerator: false,
            ..Config::default()
        };
        let loader = config.loader_config();
        assert_eq!(loader.layout.weights_dir, PathBuf::from("/w"));
        assert_eq!(loader.layout.format, WeightFormat::Safetensors);
        assert_eq!(loader.layout.accelerator_suffix, "cuda");
        assert!(!loader.half_precision_on_accelerator);
    }

    #[test]
    fn test_save_then_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            weights_dir: PathBuf::from("/w"),
            device: DevicePreference::Gpu,
            catalog: vec![CatalogEntry::url("swin_b", "https://h/swin_b.pth")],
            ..Config::default()
        };

        config.save(&path).unwrap();
        let parsed: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
