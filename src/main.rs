// cvu - resolve, download and load pretrained weights
// Main entry point

use anyhow::Result;
use clap::Parser;

use cvu::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::run(cli)
}
