// Candle runtime - native Rust weight loading
//
// Reads PyTorch pickles (.pth) and safetensors into named tensors bound to a
// candle Device. Architectures are built on top of these weights by callers.

use candle_core::{DType, Device, Tensor};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::errors::LoadError;
use crate::models::device::{Accelerator, AcceleratorKind, ConcreteDevice};
use crate::models::loader::ModelLoader;
use crate::models::runtime::{ModelRuntime, Precision, RunMode};

/// Weights loaded by [`CandleRuntime`]
#[derive(Debug)]
pub struct CandleWeights {
    tensors: HashMap<String, Tensor>,
    device: Device,
    mode: RunMode,
    source: PathBuf,
}

impl CandleWeights {
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    pub fn tensors(&self) -> &HashMap<String, Tensor> {
        &self.tensors
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Total number of scalar parameters
    pub fn parameter_count(&self) -> usize {
        self.tensors.values().map(|t| t.elem_count()).sum()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// File the weights were read from
    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Candle-backed [`ModelRuntime`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CandleRuntime;

impl CandleRuntime {
    pub fn new() -> Self {
        Self
    }

    /// Map a resolved device onto a candle Device
    pub fn candle_device(device: &ConcreteDevice) -> Result<Device, LoadError> {
        match device {
            ConcreteDevice::Cpu => Ok(Device::Cpu),
            ConcreteDevice::Accelerator(acc) => open_accelerator(*acc, &device.to_string()),
            ConcreteDevice::Explicit(name) => match parse_explicit(name)? {
                Some(acc) => open_accelerator(acc, name),
                None => Ok(Device::Cpu),
            },
        }
    }
}

/// `cpu`, `cuda`, `cuda:N`, `metal`, `metal:N`; `None` means CPU
fn parse_explicit(name: &str) -> Result<Option<Accelerator>, LoadError> {
    let unusable = |reason: &str| LoadError::DeviceResolution {
        device: name.to_string(),
        reason: reason.to_string(),
    };

    let (kind, ordinal) = match name.split_once(':') {
        Some((kind, ordinal)) => {
            let ordinal = ordinal
                .parse::<usize>()
                .map_err(|_| unusable("device ordinal is not a number"))?;
            (kind, ordinal)
        }
        None => (name, 0),
    };

    match kind {
        "cpu" if ordinal == 0 => Ok(None),
        "cuda" => Ok(Some(Accelerator::cuda(ordinal))),
        "metal" => Ok(Some(Accelerator::metal(ordinal))),
        _ => Err(unusable("expected cpu, cuda[:N] or metal[:N]")),
    }
}

fn open_accelerator(acc: Accelerator, label: &str) -> Result<Device, LoadError> {
    let device = match acc.kind {
        AcceleratorKind::Cuda => Device::new_cuda(acc.ordinal),
        AcceleratorKind::Metal => Device::new_metal(acc.ordinal),
    };
    device.map_err(|e| LoadError::DeviceResolution {
        device: label.to_string(),
        reason: e.to_string(),
    })
}

impl ModelLoader<CandleRuntime> {
    /// Candle loader with the downloader and layout described by `config`
    pub fn from_config(config: &Config) -> Self {
        ModelLoader::new(CandleRuntime::new(), config.downloader(), config.loader_config())
    }
}

impl ModelRuntime for CandleRuntime {
    type Model = CandleWeights;

    fn accelerator(&self) -> Option<Accelerator> {
        // The utils checks are compile-time; opening the device confirms hardware
        if candle_core::utils::cuda_is_available() && Device::new_cuda(0).is_ok() {
            return Some(Accelerator::cuda(0));
        }
        if candle_core::utils::metal_is_available() && Device::new_metal(0).is_ok() {
            return Some(Accelerator::metal(0));
        }
        None
    }

    fn deserialize(&self, path: &Path, device: &ConcreteDevice) -> Result<CandleWeights, LoadError> {
        let candle_device = Self::candle_device(device)?;
        std::fs::metadata(path).map_err(|e| LoadError::io(path, e))?;

        let deserialization = |reason: String| LoadError::Deserialization {
            path: path.to_path_buf(),
            reason,
        };

        let is_safetensors = path
            .extension()
            .map(|ext| ext == "safetensors")
            .unwrap_or(false);

        let tensors = if is_safetensors {
            candle_core::safetensors::load(path, &candle_device)
                .map_err(|e| deserialization(e.to_string()))?
        } else {
            candle_core::pickle::read_all(path)
                .and_then(|named| {
                    named
                        .into_iter()
                        .map(|(name, t)| t.to_device(&candle_device).map(|t| (name, t)))
                        .collect::<candle_core::Result<HashMap<_, _>>>()
                })
                .map_err(|e| deserialization(e.to_string()))?
        };

        if tensors.is_empty() {
            return Err(deserialization("no tensors found".to_string()));
        }

        tracing::debug!("Loaded {} tensors from {:?}", tensors.len(), path);

        Ok(CandleWeights {
            tensors,
            device: candle_device,
            mode: RunMode::Train,
            source: path.to_path_buf(),
        })
    }

    fn switch_precision(
        &self,
        model: &mut CandleWeights,
        precision: Precision,
    ) -> Result<(), LoadError> {
        let target = match precision {
            Precision::Full => DType::F32,
            Precision::Half => DType::F16,
        };

        // Integer tensors (indices, counters) keep their dtype
        for tensor in model.tensors.values_mut() {
            if tensor.dtype().is_float() && tensor.dtype() != target {
                *tensor = tensor
                    .to_dtype(target)
                    .map_err(|e| LoadError::Deserialization {
                        path: model.source.clone(),
                        reason: format!("cannot convert to {}: {}", precision, e),
                    })?;
            }
        }
        Ok(())
    }

    fn switch_mode(&self, model: &mut CandleWeights, mode: RunMode) {
        model.mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LoadErrorKind;

    fn write_safetensors(path: &Path) {
        let mut tensors = HashMap::new();
        tensors.insert(
            "backbone.weight".to_string(),
            Tensor::ones((2, 3), DType::F32, &Device::Cpu).unwrap(),
        );
        tensors.insert(
            "backbone.steps".to_string(),
            Tensor::new(&[1u32, 2, 3], &Device::Cpu).unwrap(),
        );
        candle_core::safetensors::save(&tensors, path).unwrap();
    }

    #[test]
    fn test_load_safetensors_on_cpu() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.safetensors");
        write_safetensors(&path);

        let weights = CandleRuntime::new()
            .deserialize(&path, &ConcreteDevice::Cpu)
            .unwrap();

        assert_eq!(weights.len(), 2);
        assert_eq!(weights.parameter_count(), 9);
        assert!(weights.device().is_cpu());
        assert_eq!(weights.mode(), RunMode::Train);
    }

    #[test]
    fn test_half_precision_skips_integer_tensors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.safetensors");
        write_safetensors(&path);

        let runtime = CandleRuntime::new();
        let mut weights = runtime.deserialize(&path, &ConcreteDevice::Cpu).unwrap();
        runtime.switch_precision(&mut weights, Precision::Half).unwrap();

        assert_eq!(weights.get("backbone.weight").unwrap().dtype(), DType::F16);
        assert_eq!(weights.get("backbone.steps").unwrap().dtype(), DType::U32);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CandleRuntime::new()
            .deserialize(&dir.path().join("gone.pth"), &ConcreteDevice::Cpu)
            .unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Io);
    }

    #[test]
    fn test_switch_mode_records_eval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.safetensors");
        write_safetensors(&path);

        let runtime = CandleRuntime::new();
        let mut weights = runtime.deserialize(&path, &ConcreteDevice::Cpu).unwrap();
        runtime.switch_mode(&mut weights, RunMode::Eval);
        assert_eq!(weights.mode(), RunMode::Eval);
    }

    #[test]
    fn test_garbage_bytes_are_deserialization_errors() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["bad.pth", "bad.safetensors"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"definitely not a model").unwrap();

            let err = CandleRuntime::new()
                .deserialize(&path, &ConcreteDevice::Cpu)
                .unwrap_err();
            assert_eq!(err.kind(), LoadErrorKind::Deserialization, "{}", name);
        }
    }

    #[test]
    fn test_unknown_explicit_device_is_rejected() {
        for name in ["tpu:0", "cuda:x", "cpu:1", ""] {
            let err = CandleRuntime::candle_device(&ConcreteDevice::Explicit(name.into()))
                .unwrap_err();
            assert_eq!(err.kind(), LoadErrorKind::DeviceResolution, "{:?}", name);
        }
    }

    #[test]
    fn test_explicit_cpu_maps_to_cpu() {
        let device = CandleRuntime::candle_device(&ConcreteDevice::Explicit("cpu".into())).unwrap();
        assert!(device.is_cpu());
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_cuda_without_support_is_device_error() {
        let err = CandleRuntime::candle_device(&ConcreteDevice::Explicit("cuda:0".into()))
            .unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::DeviceResolution);
    }

    #[cfg(not(any(feature = "cuda", feature = "metal")))]
    #[test]
    fn test_no_accelerator_without_support() {
        assert_eq!(CandleRuntime::new().accelerator(), None);
    }
}
