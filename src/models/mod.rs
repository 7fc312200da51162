// Weight resolution and model loading

pub mod catalog;
pub mod device;
pub mod download;
pub mod loader;
pub mod loaders;
pub mod runtime;
pub mod weights;

#[cfg(feature = "candle")]
pub mod unicl;
#[cfg(feature = "candle")]
pub mod yolov5;

pub use catalog::{CatalogEntry, WeightCatalog, WeightSource};
pub use device::{resolve_device, Accelerator, AcceleratorKind, ConcreteDevice};
pub use download::{CatalogDownloader, Downloader};
pub use loader::{LoaderConfig, ModelHandle, ModelLoader};
pub use runtime::{ModelRuntime, Precision, RunMode};
pub use weights::{resolve_weight_path, WeightFormat, WeightLayout, WeightSpec};

#[cfg(feature = "candle")]
pub use unicl::UniCl;
#[cfg(feature = "candle")]
pub use yolov5::Yolov5;
