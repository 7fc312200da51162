// Weight path resolution
//
// A weight spec is either a path to an existing file or a symbolic name such
// as "swin_b" or "yolov5s". Names map to `<weights_dir>/<name>[.<suffix>].<ext>`,
// where the suffix marks the accelerator build of the weights.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::device::ConcreteDevice;
use super::download::Downloader;
use crate::errors::LoadError;

/// Default suffix marking accelerator-optimized weights
pub const DEFAULT_ACCELERATOR_SUFFIX: &str = "cuda";

/// Serialization format of a weight artifact (the downloader's format tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightFormat {
    /// PyTorch pickle (`.pth`)
    #[default]
    Torch,
    /// safetensors (`.safetensors`)
    Safetensors,
}

impl WeightFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            WeightFormat::Torch => "pth",
            WeightFormat::Safetensors => "safetensors",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightFormat::Torch => "torch",
            WeightFormat::Safetensors => "safetensors",
        }
    }
}

impl fmt::Display for WeightFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A classified weight spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightSpec {
    /// Existing filesystem entry, used as-is
    Path(PathBuf),
    /// Symbolic name resolved through the weights directory
    Name(String),
}

impl WeightSpec {
    /// Existence on disk wins over any name interpretation.
    pub fn classify(spec: &str) -> Self {
        let path = Path::new(spec);
        if path.exists() {
            WeightSpec::Path(path.to_path_buf())
        } else {
            WeightSpec::Name(spec.to_string())
        }
    }
}

/// Where symbolic weights live and how their files are named
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightLayout {
    pub weights_dir: PathBuf,
    pub format: WeightFormat,
    pub accelerator_suffix: String,
}

impl WeightLayout {
    pub fn new(weights_dir: impl Into<PathBuf>) -> Self {
        Self {
            weights_dir: weights_dir.into(),
            format: WeightFormat::default(),
            accelerator_suffix: DEFAULT_ACCELERATOR_SUFFIX.to_string(),
        }
    }

    pub fn with_format(mut self, format: WeightFormat) -> Self {
        self.format = format;
        self
    }

    /// File stem for `name` on `device`, e.g. `swin_b.cuda`
    pub fn file_stem(&self, name: &str, device: &ConcreteDevice) -> String {
        if device.is_cpu() {
            name.to_string()
        } else {
            format!("{}.{}", name, self.accelerator_suffix)
        }
    }

    /// Conventional location of `name` on `device`. Does not touch the disk.
    pub fn path_for(&self, name: &str, device: &ConcreteDevice) -> PathBuf {
        self.weights_dir.join(format!(
            "{}.{}",
            self.file_stem(name, device),
            self.format.extension()
        ))
    }
}

/// Resolve a weight spec to a readable local file, downloading if needed.
pub fn resolve_weight_path(
    spec: &str,
    device: &ConcreteDevice,
    layout: &WeightLayout,
    downloader: &dyn Downloader,
) -> Result<PathBuf, LoadError> {
    let name = match WeightSpec::classify(spec) {
        WeightSpec::Path(path) => {
            tracing::debug!("Using weights at existing path {:?}", path);
            return Ok(path);
        }
        WeightSpec::Name(name) => name,
    };

    validate_name(&name)?;

    let path = layout.path_for(&name, device);
    if path.is_file() {
        tracing::debug!("Weights '{}' already present at {:?}", name, path);
        return Ok(path);
    }

    tracing::info!("Weights '{}' not found locally, downloading to {:?}", name, path);
    downloader.download(&path, layout.format)?;

    if !path.is_file() {
        return Err(LoadError::WeightResolution {
            spec: spec.to_string(),
            reason: format!("download finished but {} is missing", path.display()),
        });
    }

    Ok(path)
}

/// A name that is not an existing path must still look like a name
fn validate_name(name: &str) -> Result<(), LoadError> {
    let reason = if name.trim().is_empty() {
        Some("weight name is empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("no such file, and a path is not a valid weight name")
    } else if name.starts_with('.') {
        Some("weight names cannot start with '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(LoadError::WeightResolution {
            spec: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LoadErrorKind;
    use crate::models::device::Accelerator;
    use std::cell::RefCell;

    /// Records calls; optionally writes the file it is asked for
    struct RecordingDownloader {
        calls: RefCell<Vec<(PathBuf, WeightFormat)>>,
        write: bool,
    }

    impl RecordingDownloader {
        fn new(write: bool) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                write,
            }
        }
    }

    impl Downloader for RecordingDownloader {
        fn download(&self, target: &Path, format: WeightFormat) -> Result<(), LoadError> {
            self.calls.borrow_mut().push((target.to_path_buf(), format));
            if self.write {
                std::fs::write(target, b"weights").map_err(|e| LoadError::io(target, e))?;
            }
            Ok(())
        }
    }

    fn gpu() -> ConcreteDevice {
        ConcreteDevice::Accelerator(Accelerator::cuda(0))
    }

    #[test]
    fn test_existing_path_is_returned_unchanged() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let spec = file.path().to_str().unwrap();
        let layout = WeightLayout::new("/nonexistent/weights");
        let downloader = RecordingDownloader::new(false);

        for device in [ConcreteDevice::Cpu, gpu(), ConcreteDevice::Explicit("x".into())] {
            let resolved = resolve_weight_path(spec, &device, &layout, &downloader).unwrap();
            assert_eq!(resolved, file.path());
        }
        assert!(downloader.calls.borrow().is_empty());
    }

    #[test]
    fn test_cpu_name_has_no_suffix() {
        let layout = WeightLayout::new("/w");
        assert_eq!(
            layout.path_for("swin_b", &ConcreteDevice::Cpu),
            PathBuf::from("/w/swin_b.pth")
        );
    }

    #[test]
    fn test_accelerator_name_gets_suffix() {
        let layout = WeightLayout::new("/w");
        assert_eq!(layout.path_for("swin_b", &gpu()), PathBuf::from("/w/swin_b.cuda.pth"));
        assert_eq!(
            layout.path_for("swin_b", &ConcreteDevice::Explicit("metal:0".into())),
            PathBuf::from("/w/swin_b.cuda.pth")
        );
    }

    #[test]
    fn test_format_changes_extension() {
        let layout = WeightLayout::new("/w").with_format(WeightFormat::Safetensors);
        assert_eq!(
            layout.path_for("yolov5s", &ConcreteDevice::Cpu),
            PathBuf::from("/w/yolov5s.safetensors")
        );
    }

    #[test]
    fn test_missing_name_triggers_download() {
        let dir = tempfile::tempdir().unwrap();
        let layout = WeightLayout::new(dir.path());
        let downloader = RecordingDownloader::new(true);

        let resolved =
            resolve_weight_path("swin_b", &ConcreteDevice::Cpu, &layout, &downloader).unwrap();

        assert_eq!(resolved, dir.path().join("swin_b.pth"));
        assert!(resolved.is_file());
        let calls = downloader.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (dir.path().join("swin_b.pth"), WeightFormat::Torch));
    }

    #[test]
    fn test_present_name_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("swin_b.cuda.pth"), b"cached").unwrap();
        let layout = WeightLayout::new(dir.path());
        let downloader = RecordingDownloader::new(false);

        let resolved = resolve_weight_path("swin_b", &gpu(), &layout, &downloader).unwrap();

        assert_eq!(resolved, dir.path().join("swin_b.cuda.pth"));
        assert!(downloader.calls.borrow().is_empty());
    }

    #[test]
    fn test_download_that_writes_nothing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = WeightLayout::new(dir.path());
        let downloader = RecordingDownloader::new(false);

        let err = resolve_weight_path("swin_t", &ConcreteDevice::Cpu, &layout, &downloader)
            .unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::WeightResolution);
    }

    #[test]
    fn test_missing_path_like_spec_is_rejected() {
        let layout = WeightLayout::new("/w");
        let downloader = RecordingDownloader::new(true);

        for spec in ["", "  ", "/tmp/does/not/exist.pth", "weights/foo", ".hidden"] {
            let err = resolve_weight_path(spec, &ConcreteDevice::Cpu, &layout, &downloader)
                .unwrap_err();
            assert_eq!(err.kind(), LoadErrorKind::WeightResolution, "spec {:?}", spec);
        }
        assert!(downloader.calls.borrow().is_empty());
    }
}
