// Command-line interface

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::run;

/// Resolve, download and load pretrained computer-vision weights
#[derive(Debug, Parser)]
#[command(name = "cvu", version, about)]
pub struct Cli {
    /// Config file (default: ~/.cvu/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the weights directory
    #[arg(long, global = true, value_name = "DIR", env = "CVU_WEIGHTS_DIR")]
    pub weights_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show accelerator availability and how each preference resolves
    Devices,

    /// Resolve a weight to a local file, downloading it if needed
    Resolve {
        /// Path to a weight file, or a name such as swin_b
        weight: String,

        /// auto, cpu, gpu, or an explicit device such as cuda:1
        #[arg(long, short)]
        device: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a weight onto a device and print a summary
    Load {
        /// Path to a weight file, or a name such as swin_b
        weight: String,

        /// auto, cpu, gpu, or an explicit device such as cuda:1
        #[arg(long, short)]
        device: Option<String>,
    },

    /// List weights the catalog can download
    Catalog {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
}
