use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{io::Write, path::Path};

use super::raw_table::RawTable;

/// Read a delimited file with a header row. Ragged rows are accepted; short
/// ones read as null in the trailing columns.
pub fn read_delimited(path: &Path, delimiter: u8) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("parsing row {} of {}", i + 1, path.display()))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    Ok(RawTable { headers, rows })
}

/// Write `headers` then `rows` as comma-delimited text.
pub fn write_delimited<W: Write>(
    out: W,
    headers: &[String],
    rows: impl IntoIterator<Item = Vec<String>>,
) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    wtr.write_record(headers).context("writing header")?;
    for row in rows {
        wtr.write_record(&row).context("writing row")?;
    }
    wtr.flush().context("flushing writer")?;
    Ok(())
}
