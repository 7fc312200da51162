// Subcommand handlers

use anyhow::{Context, Result};
use std::path::Path;

use super::{Cli, Command};
use crate::config::{load_config, load_config_from, Config, DevicePreference};
use crate::errors::{self, LoadError};
use crate::models::catalog::{WeightCatalog, WeightSource};
use crate::models::loaders::{CandleRuntime, CandleWeights};
use crate::models::{ConcreteDevice, ModelHandle, ModelLoader, ModelRuntime};

pub fn run(cli: Cli) -> Result<()> {
    let mut config = match cli.config {
        Some(ref path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(dir) = cli.weights_dir {
        config.weights_dir = dir;
    }

    crate::logging::init_tracing(cli.debug || config.debug_logging);

    let loader = ModelLoader::<CandleRuntime>::from_config(&config);

    match cli.command {
        Command::Devices => print!("{}", format_devices(&loader)),
        Command::Resolve {
            weight,
            device,
            json,
        } => {
            let preference = preference(device, &config);
            let device = loader.resolve_device(&preference);
            let path = loader
                .resolve_weight_path(&weight, &device)
                .map_err(|e| explain(e, &config))
                .with_context(|| format!("Failed to resolve '{}'", weight))?;
            if json {
                println!("{}", resolution_json(&device, &path)?);
            } else {
                println!("device: {}", device);
                println!("path:   {}", path.display());
            }
        }
        Command::Load { weight, device } => {
            let preference = preference(device, &config);
            let handle = loader
                .load_model(&weight, &preference)
                .map_err(|e| explain(e, &config))
                .with_context(|| format!("Failed to load '{}'", weight))?;
            print!("{}", format_summary(&handle));
        }
        Command::Catalog { json } => {
            let catalog = config.weight_catalog();
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.entries())?);
            } else {
                print!("{}", format_catalog(&catalog));
            }
        }
    }

    Ok(())
}

/// Attach the list of known names to unknown-weight errors
fn explain(err: LoadError, config: &Config) -> anyhow::Error {
    match err {
        LoadError::UnknownWeight { ref name, format } => {
            let known = config.weight_catalog().names(format);
            anyhow::anyhow!(errors::unknown_weight_error(name, &known))
        }
        other => other.into(),
    }
}

/// --device flag, falling back to the configured default
fn preference(flag: Option<String>, config: &Config) -> DevicePreference {
    flag.map(DevicePreference::from)
        .unwrap_or_else(|| config.device.clone())
}

fn format_devices<R: ModelRuntime>(loader: &ModelLoader<R>) -> String {
    let accelerator = match loader.runtime().accelerator() {
        Some(acc) => acc.to_string(),
        None => "none".to_string(),
    };

    let mut out = format!("accelerator: {}\n", accelerator);
    for preference in [
        DevicePreference::Auto,
        DevicePreference::Gpu,
        DevicePreference::Cpu,
    ] {
        out.push_str(&format!(
            "  {:<5} -> {}\n",
            preference.as_str(),
            loader.resolve_device(&preference)
        ));
    }
    out
}

fn resolution_json(device: &ConcreteDevice, path: &Path) -> Result<String> {
    let value = serde_json::json!({
        "device": device.to_string(),
        "path": path.display().to_string(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

fn format_summary(handle: &ModelHandle<CandleWeights>) -> String {
    let weights = handle.model();
    format!(
        "✓ Loaded {}\n  device:     {}\n  precision:  {}\n  tensors:    {}\n  parameters: {}\n",
        handle.weight_path().display(),
        handle.device(),
        handle.precision(),
        weights.len(),
        weights.parameter_count()
    )
}

fn format_catalog(catalog: &WeightCatalog) -> String {
    if catalog.is_empty() {
        return "No weights configured. Add [[weights]] entries to ~/.cvu/config.toml\n"
            .to_string();
    }

    let mut out = String::new();
    for entry in catalog.entries() {
        let source = match &entry.source {
            WeightSource::Url { url } => url.clone(),
            WeightSource::Hub {
                repo,
                file,
                revision,
            } => match revision {
                Some(rev) => format!("hf://{}@{}/{}", repo, rev, file),
                None => format!("hf://{}/{}", repo, file),
            },
        };
        let checked = if entry.sha256.is_some() { " (sha256)" } else { "" };
        out.push_str(&format!(
            "{:<20} {:<12} {}{}\n",
            entry.name, entry.format, source, checked
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::CatalogEntry;

    #[test]
    fn test_preference_flag_wins_over_config() {
        let config = Config {
            device: DevicePreference::Gpu,
            ..Config::default()
        };
        assert_eq!(preference(Some("cpu".into()), &config), DevicePreference::Cpu);
        assert_eq!(preference(None, &config), DevicePreference::Gpu);
    }

    #[test]
    fn test_explain_unknown_weight_lists_catalog() {
        let config = Config {
            catalog: vec![CatalogEntry::url("swin_b", "https://h/swin_b.pth")],
            ..Config::default()
        };
        let err = LoadError::UnknownWeight {
            name: "swin_q".to_string(),
            format: crate::models::WeightFormat::Torch,
        };
        let msg = explain(err, &config).to_string();
        assert!(msg.contains("Unknown weights 'swin_q'"), "got: {}", msg);
        assert!(msg.contains("• swin_b"), "got: {}", msg);
    }

    #[test]
    fn test_format_catalog() {
        let catalog = WeightCatalog::new(vec![
            CatalogEntry::url("swin_b", "https://h/swin_b.pth"),
            CatalogEntry::hub("yolov5s", "org/yolo", "yolov5s.pth").with_sha256("a".repeat(64)),
        ]);
        let out = format_catalog(&catalog);
        assert!(out.contains("swin_b"));
        assert!(out.contains("https://h/swin_b.pth"));
        assert!(out.contains("hf://org/yolo/yolov5s.pth (sha256)"));
    }

    #[test]
    fn test_resolution_json() {
        let out = resolution_json(&ConcreteDevice::Cpu, Path::new("/w/swin_b.pth")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["device"], "cpu");
        assert_eq!(value["path"], "/w/swin_b.pth");
    }

    #[test]
    fn test_catalog_json_matches_config_schema() {
        let catalog = WeightCatalog::new(vec![CatalogEntry::hub("yolov5s", "org/yolo", "yolov5s.pth")
            .with_revision("v7.0")]);
        let out = serde_json::to_string(catalog.entries()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["name"], "yolov5s");
        assert_eq!(value[0]["format"], "torch");
        assert_eq!(value[0]["repo"], "org/yolo");
        assert_eq!(value[0]["revision"], "v7.0");
        assert!(value[0].get("sha256").is_none());
    }

    #[test]
    fn test_format_empty_catalog() {
        assert!(format_catalog(&WeightCatalog::default()).contains("No weights configured"));
    }

    #[test]
    fn test_format_devices_lists_all_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ModelLoader::new(
            CandleRuntime::new(),
            crate::models::CatalogDownloader::new(WeightCatalog::default()),
            crate::models::LoaderConfig::new(dir.path()),
        );
        let out = format_devices(&loader);
        assert!(out.starts_with("accelerator: "));
        assert!(out.contains("cpu   -> cpu"));
        assert!(out.contains("auto  -> "));
    }
}
