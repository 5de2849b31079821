//! CSV Export
//!
//! One row per decoded struct, one column per layout field.

use std::io::Write;

use crate::domain::storage::DecodedStruct;
use crate::modules::inspect::{ArraySnapshot, StructSnapshot};

/// Write array elements as CSV: `index,slot,<fields...>`
pub fn write_array<W: Write>(out: W, snapshot: &ArraySnapshot) -> anyhow::Result<usize> {
    let mut wtr = csv::Writer::from_writer(out);

    let mut header = vec!["index", "slot"];
    header.extend(snapshot.field_names.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for element in &snapshot.elements {
        let mut record = vec![element.index.to_string(), element.slot.to_string()];
        record.extend(element.fields.iter().map(|(_, value)| value.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(snapshot.elements.len())
}

/// Write a single struct as a two-row CSV: `slot,<fields...>`
pub fn write_struct<W: Write>(out: W, snapshot: &StructSnapshot) -> anyhow::Result<usize> {
    let mut wtr = csv::Writer::from_writer(out);

    let mut header = vec!["slot"];
    header.extend(snapshot.fields.iter().map(|(name, _)| name));
    wtr.write_record(&header)?;

    let mut record = vec![snapshot.slot.to_string()];
    record.extend(snapshot.fields.iter().map(|(_, value)| value.to_string()));
    wtr.write_record(&record)?;

    wtr.flush()?;
    Ok(1)
}

/// Write bare decoded fields as a header row and a value row
pub fn write_fields<W: Write>(out: W, fields: &DecodedStruct) -> anyhow::Result<usize> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(fields.iter().map(|(name, _)| name))?;
    wtr.write_record(fields.iter().map(|(_, value)| value.to_string()))?;
    wtr.flush()?;
    Ok(1)
}
