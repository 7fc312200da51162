// cvu - pretrained weight resolution and model loading
// Library exports

pub mod config;
pub mod errors;
pub mod logging;
pub mod models;

#[cfg(feature = "candle")]
pub mod cli;

pub use config::{Config, DevicePreference};
pub use errors::{LoadError, LoadErrorKind};
pub use models::{ConcreteDevice, ModelHandle, ModelLoader, ModelRuntime};
