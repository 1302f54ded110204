//! `sagan config` - show the effective configuration after merging.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::infrastructure::config::ConfigLoader;

#[derive(Args)]
pub struct ConfigArgs {
    /// Config file path (defaults to the hierarchical project config)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: ConfigArgs, json: bool) -> Result<()> {
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", serde_yaml::to_string(&config)?);
    }

    Ok(())
}
