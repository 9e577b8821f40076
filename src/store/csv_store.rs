use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord, Writer};

use super::TranslationRecord;
use crate::util::ensure_parent_directory;

const UTF8_BOM: char = '\u{feff}';
const HEADER: [&str; 4] = ["location", "context", "source", "target"];

/// Column positions resolved from a CSV header row.
struct Columns {
    location: Option<usize>,
    context: Option<usize>,
    source: usize,
    target: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };

        let Some(source) = find("source") else {
            bail!("CSV store has no 'source' column");
        };
        let Some(target) = find("target").or_else(|| find("translation")) else {
            bail!("CSV store has no 'target' or 'translation' column");
        };

        Ok(Self {
            location: find("location"),
            context: find("context"),
            source,
            target,
        })
    }
}

pub fn read_rows(path: &Path) -> Result<Vec<TranslationRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_rows(&raw)
        .with_context(|| format!("failed to parse translation store {}", path.display()))
}

/// Parses CSV text with a header row. A leading byte-order mark is ignored,
/// header names match case-insensitively and `translation` stands in for a
/// missing `target` column.
pub fn parse_rows(raw: &str) -> Result<Vec<TranslationRecord>> {
    let text = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut rows = Vec::<TranslationRecord>::new();
    for record in reader.records() {
        let record = record?;
        rows.push(TranslationRecord {
            location: field(&record, columns.location),
            context: field(&record, columns.context),
            source: field(&record, Some(columns.source)),
            target: field(&record, Some(columns.target)),
        });
    }

    Ok(rows)
}

pub fn write_rows(path: &Path, records: &[TranslationRecord]) -> Result<()> {
    ensure_parent_directory(path)?;

    let mut writer = Writer::from_path(path)
        .with_context(|| format!("failed to create csv file: {}", path.display()))?;
    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record([
            &record.location,
            &record.context,
            &record.source,
            &record.target,
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write csv file: {}", path.display()))?;

    Ok(())
}

fn field(record: &StringRecord, column: Option<usize>) -> String {
    column
        .and_then(|index| record.get(index))
        .unwrap_or_default()
        .to_string()
}
