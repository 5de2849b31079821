//! Export Module
//!
//! Renders decoded snapshots as text, JSON or CSV.
//!
//! - Output goes to stdout unless `--out` is given
//! - `--out <dir>` writes a timestamped file into that directory

mod csv_export;
mod json_export;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::ValueEnum;

use crate::domain::storage::DecodedStruct;
use crate::modules::inspect::{ArraySnapshot, StructSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Generate a timestamped filename
fn generate_filename(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{}-{}.{}", prefix, timestamp, extension)
}

/// Resolve where output should go; `None` means stdout
pub fn output_path(out: Option<&Path>, prefix: &str, format: OutputFormat) -> Result<Option<PathBuf>> {
    let Some(out) = out else {
        return Ok(None);
    };
    if out.is_dir() {
        return Ok(Some(out.join(generate_filename(prefix, format.extension()))));
    }
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    Ok(Some(out.to_path_buf()))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

pub fn render_array<W: Write>(mut out: W, snapshot: &ArraySnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => json_export::write_snapshot(out, snapshot),
        OutputFormat::Csv => csv_export::write_array(out, snapshot).map(|_| ()),
        OutputFormat::Text => {
            writeln!(
                out,
                "{} {} @ block {}: length={} declared_slot={} base_slot={} stride={}",
                snapshot.layout,
                snapshot.address,
                snapshot.block,
                snapshot.length,
                snapshot.declared_slot,
                snapshot.base_slot,
                snapshot.stride
            )?;
            for element in &snapshot.elements {
                let fields = element
                    .fields
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(out, "[{}] slot={} {}", element.index, element.slot, fields)?;
            }
            Ok(())
        }
    }
}

pub fn render_struct<W: Write>(mut out: W, snapshot: &StructSnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => json_export::write_snapshot(out, snapshot),
        OutputFormat::Csv => csv_export::write_struct(out, snapshot).map(|_| ()),
        OutputFormat::Text => {
            writeln!(
                out,
                "{} {} @ block {} slot {}",
                snapshot.layout, snapshot.address, snapshot.block, snapshot.slot
            )?;
            for (name, value) in snapshot.fields.iter() {
                writeln!(out, "  {}: {}", name, value)?;
            }
            Ok(())
        }
    }
}

/// Render fields decoded from caller-supplied words, with no chain context
pub fn render_decoded<W: Write>(
    mut out: W,
    layout: &str,
    fields: &DecodedStruct,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => json_export::write_snapshot(out, fields),
        OutputFormat::Csv => csv_export::write_fields(out, fields).map(|_| ()),
        OutputFormat::Text => {
            writeln!(out, "{}", layout)?;
            for (name, value) in fields.iter() {
                writeln!(out, "  {}: {}", name, value)?;
            }
            Ok(())
        }
    }
}

/// Render an array snapshot to stdout or `out`, returning the file written
pub fn export_array(snapshot: &ArraySnapshot, format: OutputFormat, out: Option<&Path>) -> Result<Option<PathBuf>> {
    let path = output_path(out, &snapshot.layout, format)?;
    let mut writer = open_output(path.as_deref())?;
    render_array(&mut writer, snapshot, format)?;
    writer.flush()?;
    if let Some(path) = &path {
        tracing::info!(path = %path.display(), elements = snapshot.elements.len(), "exported array");
    }
    Ok(path)
}

/// Render a struct snapshot to stdout or `out`, returning the file written
pub fn export_struct(snapshot: &StructSnapshot, format: OutputFormat, out: Option<&Path>) -> Result<Option<PathBuf>> {
    let path = output_path(out, &snapshot.layout, format)?;
    let mut writer = open_output(path.as_deref())?;
    render_struct(&mut writer, snapshot, format)?;
    writer.flush()?;
    if let Some(path) = &path {
        tracing::info!(path = %path.display(), "exported struct");
    }
    Ok(path)
}
