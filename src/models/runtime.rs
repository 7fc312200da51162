// Runtime model factory - the seam to the deep-learning framework

use std::fmt;
use std::path::Path;

use super::device::{Accelerator, ConcreteDevice};
use crate::errors::LoadError;

/// Numeric precision of a loaded model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Full,
    Half,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Full => f.write_str("f32"),
            Precision::Half => f.write_str("f16"),
        }
    }
}

/// Training vs. inference behavior of a loaded model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    Train,
    Eval,
}

/// Deserializes weight artifacts into runtime models.
///
/// Implemented by the candle backend and by fakes in tests; the loader only
/// talks to the framework through this trait.
pub trait ModelRuntime {
    type Model;

    /// Best accelerator available right now, if any
    fn accelerator(&self) -> Option<Accelerator>;

    /// Load the artifact at `path` onto `device`.
    ///
    /// Fails with `DeviceResolution` if `device` cannot be opened and with
    /// `Deserialization` if the bytes are not a model this runtime reads.
    fn deserialize(&self, path: &Path, device: &ConcreteDevice) -> Result<Self::Model, LoadError>;

    fn switch_precision(&self, model: &mut Self::Model, precision: Precision)
        -> Result<(), LoadError>;

    fn switch_mode(&self, model: &mut Self::Model, mode: RunMode);
}
