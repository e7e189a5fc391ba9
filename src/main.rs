// Command-line entry point: archive a cohost account into a local directory.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cohost_archive::ArchiveConfig;

#[derive(Debug, Parser)]
#[command(name = "cohost-archive", version, about)]
struct Cli {
    /// TOML config file with the session cookie and what to archive
    #[arg(short, long, default_value = "cohost-archive.toml")]
    config: PathBuf,

    /// Archive root, overriding `output_dir` from the config file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = ArchiveConfig::from_toml_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(output) = cli.output {
        config = config.with_output_dir(output);
    }

    let output_dir = config.output_dir().display().to_string();
    let report = cohost_archive::archive(config)
        .await
        .with_context(|| format!("setting up archive in {output_dir}"))?;

    println!("{report}");
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
