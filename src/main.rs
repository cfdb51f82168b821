//! Referendum Map - command line entry point.

use clap::Parser;
use log::info;
use referendum_map::config::AppConfig;
use referendum_map::pipeline;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration; without it the fixed data/ and output/ locations are used
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    let table = pipeline::run(&config)?;

    for row in &table.rows {
        info!(
            "{} {:<30} ratio {:.4}",
            row.result.region_code,
            row.result.region_name.as_deref().unwrap_or("?"),
            row.ratio
        );
    }
    info!("Map written to {:?}", config.output.map);

    Ok(())
}
