use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::graph::memory::MemoryGraph;

/// Write an iterator of serializable items to a JSONL file (one JSON object
/// per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

#[derive(Serialize)]
struct PressureRecord<'a> {
    name: &'a str,
    value: f64,
}

/// Flush a graph snapshot to JSONL files in the given output directory.
///
/// Creates the output directory if it does not exist. Writes 3 files:
/// - `entities.jsonl` — one entity per line
/// - `relationships.jsonl` — one relationship per line (archived included)
/// - `pressures.jsonl` — one `{name, value}` record per line
pub fn flush_to_jsonl(graph: &MemoryGraph, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(&output_dir.join("entities.jsonl"), graph.entities.values())?;
    write_jsonl(
        &output_dir.join("relationships.jsonl"),
        graph.relationships.iter(),
    )?;
    write_jsonl(
        &output_dir.join("pressures.jsonl"),
        graph
            .pressures
            .iter()
            .map(|(name, value)| PressureRecord { name, value: *value }),
    )?;

    Ok(())
}
