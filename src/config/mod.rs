// Configuration module
// Public interface for configuration loading

pub mod constants;
mod device;
mod loader;
mod settings;

pub use device::DevicePreference;
pub use loader::{default_config_path, load_config, load_config_from, parse_config};
pub use settings::{default_weights_dir, Config};
