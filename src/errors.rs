// Error types and user-facing error messages
//
// `LoadError` is what the library surfaces from a load; the string helpers
// below build the messages the config layer and CLI show to users.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::weights::WeightFormat;

/// Failure of a resolve-and-load operation.
///
/// Every variant is surfaced to the caller as soon as it happens; nothing is
/// retried or downgraded inside the loader.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The requested explicit device is not one the runtime can open
    #[error("device '{device}' is not usable: {reason}")]
    DeviceResolution { device: String, reason: String },

    /// The symbolic name is not in the downloader's catalog
    #[error("no pretrained '{format}' weights named '{name}' in the catalog")]
    UnknownWeight { name: String, format: WeightFormat },

    /// Network or checksum failure while fetching a weight artifact
    #[error("failed to download '{name}' to {}: {reason}", .path.display())]
    Download {
        name: String,
        path: PathBuf,
        reason: String,
    },

    /// The weight spec could not be turned into a local path
    #[error("cannot resolve weights '{spec}': {reason}")]
    WeightResolution { spec: String, reason: String },

    /// The artifact bytes are not a model serialization the runtime accepts
    #[error("failed to deserialize weights at {}: {reason}", .path.display())]
    Deserialization { path: PathBuf, reason: String },

    /// Local filesystem failure
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of a [`LoadError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    DeviceResolution,
    UnknownWeight,
    Download,
    WeightResolution,
    Deserialization,
    Io,
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::DeviceResolution { .. } => LoadErrorKind::DeviceResolution,
            LoadError::UnknownWeight { .. } => LoadErrorKind::UnknownWeight,
            LoadError::Download { .. } => LoadErrorKind::Download,
            LoadError::WeightResolution { .. } => LoadErrorKind::WeightResolution,
            LoadError::Deserialization { .. } => LoadErrorKind::Deserialization,
            LoadError::Io { .. } => LoadErrorKind::Io,
        }
    }

    /// True for failures of the download step (including unknown names)
    pub fn is_download_failure(&self) -> bool {
        matches!(
            self,
            LoadError::UnknownWeight { .. } | LoadError::Download { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Append a "how to fix" hint to an error message
pub fn wrap_error_with_suggestion(message: impl Into<String>, suggestion: &str) -> String {
    format!("{}\n\n{}", message.into(), suggestion)
}

/// Message for a file the user pointed us at that does not exist
pub fn file_not_found_error(path: &str, what: &str) -> String {
    wrap_error_with_suggestion(
        format!("{} not found: {}", what, path),
        "Check that the path is correct and readable.",
    )
}

/// Message for a config file that failed to parse
pub fn config_parse_error(details: &str) -> String {
    wrap_error_with_suggestion(
        format!("Failed to parse configuration: {}", details),
        "Fix the syntax in ~/.cvu/config.toml, e.g.:\n  \
         weights_dir = \"/data/weights\"\n  \
         device = \"auto\"\n\n  \
         [[weights]]\n  \
         name = \"swin_b\"\n  \
         url = \"https://...\"",
    )
}

/// Message for a symbolic weight name the catalog does not know
pub fn unknown_weight_error(name: &str, known: &[String]) -> String {
    let known = if known.is_empty() {
        "  (catalog is empty)".to_string()
    } else {
        known
            .iter()
            .map(|n| format!("  • {}", n))
            .collect::<Vec<_>>()
            .join("\n")
    };
    wrap_error_with_suggestion(
        format!("Unknown weights '{}'", name),
        &format!(
            "Known weights:\n{}\n\n\
             Add an entry under [[weights]] in ~/.cvu/config.toml, \
             or pass a path to an existing weight file.",
            known
        ),
    )
}
