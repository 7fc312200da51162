// YOLOv5 object detection weights
//
// `Yolov5::new("yolov5s", "auto")` resolves and loads the detector's
// checkpoint; decoding and drawing are built on top of `weights()`.

use anyhow::{Context, Result};
use std::path::Path;

use super::device::ConcreteDevice;
use super::loader::{ModelHandle, ModelLoader};
use super::loaders::{CandleRuntime, CandleWeights};
use super::runtime::Precision;
use crate::config::constants::DEFAULT_YOLOV5_WEIGHT;
use crate::config::{load_config, DevicePreference};

/// Loaded YOLOv5 weights, ready for inference
pub struct Yolov5 {
    handle: ModelHandle<CandleWeights>,
}

impl Yolov5 {
    /// Load `weight` (a path, or a name such as "yolov5s" / "yolov5m")
    /// using the user's configuration.
    pub fn new(weight: &str, device: impl Into<DevicePreference>) -> Result<Self> {
        let config = load_config()?;
        Self::with_loader(&ModelLoader::from_config(&config), weight, device)
    }

    /// `yolov5s` on the configured default device
    pub fn with_defaults() -> Result<Self> {
        let config = load_config()?;
        Self::with_loader(
            &ModelLoader::from_config(&config),
            DEFAULT_YOLOV5_WEIGHT,
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
            .with_context(|| format!("Failed to load YOLOv5 weights '{}'", weight))?;

        tracing::info!(
            "YOLOv5 {} ready on {} ({} parameters, {})",
            weight,
            handle.device(),
            handle.model().parameter_count(),
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
