// Project-wide constants
//
// Centralised here so file names and environment variables have one
// source of truth. Import via `use crate::config::constants::*;`.

/// Directory under $HOME holding config.toml and the default weights dir.
pub const CONFIG_DIR_NAME: &str = ".cvu";

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default weights subdirectory of the config dir.
pub const WEIGHTS_DIR_NAME: &str = "weights";

/// Weight loaded by the UniCL facade when none is given.
pub const DEFAULT_UNICL_WEIGHT: &str = "swin_b";

/// Weight loaded by the YOLOv5 facade when none is given.
pub const DEFAULT_YOLOV5_WEIGHT: &str = "yolov5s";

/// Overrides `weights_dir`.
pub const ENV_WEIGHTS_DIR: &str = "CVU_WEIGHTS_DIR";

/// Overrides `device` ("auto", "cpu", "gpu" or an explicit device such as "cuda:1").
pub const ENV_DEVICE: &str = "CVU_DEVICE";

/// HuggingFace token, used when the config file has none.
pub const ENV_HF_TOKEN: &str = "HF_TOKEN";

/// HuggingFace Hub mirror, used when the config file sets none.
pub const ENV_HF_ENDPOINT: &str = "HF_ENDPOINT";
