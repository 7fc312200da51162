// Model Loader - weight spec + device preference -> ready-to-run model
//
// device resolve -> path resolve (maybe download) -> deserialize ->
// precision switch -> eval mode. Each step either succeeds or aborts the
// whole load; no partially built handle is ever returned.

use std::path::{Path, PathBuf};

use super::device::{resolve_device, ConcreteDevice};
use super::download::Downloader;
use super::runtime::{ModelRuntime, Precision, RunMode};
use super::weights::{resolve_weight_path, WeightLayout};
use crate::config::DevicePreference;
use crate::errors::LoadError;

/// Settings the loader needs from the wider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub layout: WeightLayout,
    /// Switch models to half precision on any non-CPU device.
    ///
    /// On by default to match the published accelerator weights; half
    /// precision on accelerators is not validated for every model.
    pub half_precision_on_accelerator: bool,
}

impl LoaderConfig {
    pub fn new(weights_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: WeightLayout::new(weights_dir),
            half_precision_on_accelerator: true,
        }
    }
}

/// A loaded, device-bound, inference-mode model
#[derive(Debug)]
pub struct ModelHandle<M> {
    model: M,
    device: ConcreteDevice,
    weight_path: PathBuf,
    precision: Precision,
}

impl<M> ModelHandle<M> {
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable access for runtimes that keep per-call inference state
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn device(&self) -> &ConcreteDevice {
        &self.device
    }

    pub fn weight_path(&self) -> &Path {
        &self.weight_path
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn into_inner(self) -> M {
        self.model
    }
}

/// Resolves weights and devices, then loads models through a runtime
pub struct ModelLoader<R: ModelRuntime> {
    runtime: R,
    downloader: Box<dyn Downloader>,
    config: LoaderConfig,
}

impl<R: ModelRuntime> ModelLoader<R> {
    pub fn new(runtime: R, downloader: impl Downloader + 'static, config: LoaderConfig) -> Self {
        Self {
            runtime,
            downloader: Box::new(downloader),
            config,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Resolve a device preference against the runtime's current accelerators
    pub fn resolve_device(&self, preference: &DevicePreference) -> ConcreteDevice {
        let available = if preference.wants_accelerator() {
            self.runtime.accelerator()
        } else {
            None
        };
        resolve_device(preference, available)
    }

    /// Resolve `spec` to a local file for `device`, downloading if needed
    pub fn resolve_weight_path(
        &self,
        spec: &str,
        device: &ConcreteDevice,
    ) -> Result<PathBuf, LoadError> {
        resolve_weight_path(spec, device, &self.config.layout, self.downloader.as_ref())
    }

    /// Load `spec` onto the device chosen by `preference`
    pub fn load_model(
        &self,
        spec: &str,
        preference: &DevicePreference,
    ) -> Result<ModelHandle<R::Model>, LoadError> {
        let device = self.resolve_device(preference);
        let weight_path = self.resolve_weight_path(spec, &device)?;

        tracing::info!("Loading weights {:?} on {}", weight_path, device);
        let mut model = self.runtime.deserialize(&weight_path, &device)?;

        let precision = if !device.is_cpu() && self.config.half_precision_on_accelerator {
            self.runtime.switch_precision(&mut model, Precision::Half)?;
            tracing::debug!("Switched {:?} to half precision", weight_path);
            Precision::Half
        } else {
            Precision::Full
        };

        self.runtime.switch_mode(&mut model, RunMode::Eval);

        Ok(ModelHandle {
            model,
            device,
            weight_path,
            precision,
        })
    }
}
