//! JSON Export
//!
//! Pretty-printed snapshots. Integers are emitted as decimal strings so
//! 256-bit values survive JSON consumers.

use std::io::Write;

use serde::Serialize;

pub fn write_snapshot<W: Write, T: Serialize>(mut out: W, snapshot: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut out, snapshot)?;
    writeln!(out)?;
    Ok(())
}
