use std::path::PathBuf;

use clap::Parser;

/// OpenAI-compatible proxy that routes each chat completion to the
/// cheapest suitable upstream model
#[derive(Debug, Parser)]
#[command(name = "freerouter", version)]
pub struct Args {
    /// Path to the config file (overrides the default search order)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen port (overrides the config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Listen host (overrides the config file)
    #[arg(long)]
    pub host: Option<String>,
}
