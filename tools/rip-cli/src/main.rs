//! rip-cli - tracker module sample ripper
//!
//! Extracts every sample of a MOD, S3M, IT, XM or UMX file to WAV.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use rip_cli::{export_samples, load_module, sample_table};

#[derive(Parser)]
#[command(name = "rip-cli")]
#[command(about = "Rip the samples of a tracker module to WAV files")]
#[command(version)]
struct Cli {
    /// Module file (MOD, S3M, IT, XM or UMX)
    module: PathBuf,

    /// Output directory (must exist; defaults to the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the sample table without writing files
    #[arg(long)]
    list: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let module = load_module(&cli.module)?;
    tracing::info!("Title: {} ({})", module.title, module.format);

    if cli.list {
        print!("{}", sample_table(&module));
        return Ok(());
    }

    let output = match cli.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let written = export_samples(&module, &output)?;
    tracing::info!("Exported {} samples to {:?}", written.len(), output);

    Ok(())
}
