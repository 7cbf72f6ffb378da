//! rip-cli library
//!
//! Writes the samples of a decoded tracker module to WAV files.

pub mod naming;
pub mod wav;

use anyhow::{bail, Context, Result};
use nether_rip::Module;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Open and decode a module file
pub fn load_module(path: &Path) -> Result<Module> {
    let file = File::open(path).with_context(|| format!("Failed to open module: {:?}", path))?;
    nether_rip::identify(&mut BufReader::new(file))
        .with_context(|| format!("Failed to decode module: {:?}", path))
}

/// Write every non-empty sample of `module` into `output_dir`
///
/// Returns the written paths in sample order.
pub fn export_samples(module: &Module, output_dir: &Path) -> Result<Vec<PathBuf>> {
    if !output_dir.is_dir() {
        bail!("Output directory does not exist: {:?}", output_dir);
    }

    let mut written = Vec::new();
    for sample in module.non_empty_samples() {
        let file_name = naming::sample_file_name(sample);
        tracing::info!("Exporting sample {}", file_name);

        let path = output_dir.join(&file_name);
        wav::write_sample(sample, &path)?;
        written.push(path);
    }
    Ok(written)
}

/// One line per sample: number, size, rate, width, loop and name
pub fn sample_table(module: &Module) -> String {
    let mut table = format!(
        "{} ({}, .{})\n",
        module.title,
        module.format,
        module.format.extension()
    );
    for sample in &module.samples {
        let looping = match sample.loop_type {
            nether_rip::LoopType::Off => String::from("-"),
            kind => format!("{:?} {}..{}", kind, sample.loop_start, sample.loop_end),
        };
        table.push_str(&format!(
            "{:>3}  {:>8} B  {:>6} Hz  {:>2}-bit  {:<24}  {}\n",
            sample.number,
            sample.length,
            sample.rate,
            sample.width.bits(),
            looping,
            sample.name
        ));
    }
    table
}
