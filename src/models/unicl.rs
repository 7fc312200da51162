// UniCL image-text matching weights
//
// Entry point mirroring the Python package: `UniCl::new("swin_b", "auto")`.

use anyhow::{Context, Result};
use std::path::Path;

use super::device::ConcreteDevice;
use super::loader::{ModelHandle, ModelLoader};
use super::loaders::{CandleRuntime, CandleWeights};
use super::runtime::Precision;
use crate::config::constants::DEFAULT_UNICL_WEIGHT;
use crate::config::{load_config, DevicePreference};

/// Loaded UniCL weights, ready for inference
pub struct UniCl {
    handle: ModelHandle<CandleWeights>,
}

impl UniCl {
    /// Load `weight` (a path, or a name such as "swin_b" / "swin_t") using
    /// the user's configuration.
    pub fn new(weight: &str, device: impl Into<DevicePreference>) -> Result<Self> {
        let config = load_config()?;
        Self::with_loader(&ModelLoader::from_config(&config), weight, device)
    }

    /// `swin_b` on the configured default device
    pub fn with_defaults() -> Result<Self> {
        let config = load_config()?;
        Self::with_loader(
            &ModelLoader::from_config(&config),
            DEFAULT_UNICL_WEIGHT,
            config.device.clone(),
        )
    }

    pub fn with_loader(
        loader: &ModelLoader<CandleRuntime>,
        weight: &str,
        device: impl Into<DevicePreference>,
    ) -> Result<Self> {
        let device = device.into();
        let handle = loader
            .load_model(weight, &device)
            .with_context(|| format!("Failed to load UniCL weights '{}'", weight))?;

        tracing::info!(
            "UniCL {} ready on {} ({} tensors, {})",
            weight,
            handle.device(),
            handle.model().len(),
            handle.precision()
        );

        Ok(Self { handle })
    }

    pub fn device(&self) -> &ConcreteDevice {
        self.handle.device()
    }

    pub fn weight_path(&self) -> &Path {
        self.handle.weight_path()
    }

    pub fn precision(&self) -> Precision {
        self.handle.precision()
    }

    pub fn weights(&self) -> &CandleWeights {
        self.handle.model()
    }
}
