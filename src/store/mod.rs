//! Persisted translation store.
//!
//! `location` is the only join key between runs. A store file that does not
//! exist yet loads as an empty store: the first extraction run has nothing to
//! preserve.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cli::StoreFormat;
use crate::model::Unit;
use crate::util::{ensure_parent_directory, write_json_pretty};

mod csv_store;
mod merge;
mod sqlite_store;

pub use merge::{MergeOutcome, merge_upsert};

pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
}

impl TranslationRecord {
    pub fn untranslated(unit: &Unit) -> Self {
        Self {
            location: unit.key.clone(),
            context: unit.context.clone(),
            source: unit.source.clone(),
            target: String::new(),
        }
    }

    pub fn has_target(&self) -> bool {
        !self.target.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowIssues {
    pub missing_location: usize,
    pub duplicate_location: usize,
}

impl RowIssues {
    pub fn total(self) -> usize {
        self.missing_location + self.duplicate_location
    }
}

#[derive(Debug, Clone, Default)]
pub struct TranslationStore {
    records: Vec<TranslationRecord>,
    by_location: HashMap<String, usize>,
}

impl TranslationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from raw rows, rejecting rows without a location and
    /// keeping the first row of a repeated location.
    pub fn from_rows(rows: Vec<TranslationRecord>) -> (Self, RowIssues) {
        let mut store = Self::new();
        let mut issues = RowIssues::default();

        for mut row in rows {
            row.location = row.location.trim().to_string();
            if row.location.is_empty() {
                issues.missing_location += 1;
                continue;
            }
            if !store.push(row) {
                issues.duplicate_location += 1;
            }
        }

        (store, issues)
    }

    pub fn from_units(units: &[Unit]) -> Self {
        let mut store = Self::new();
        for unit in units {
            store.push(TranslationRecord::untranslated(unit));
        }
        store
    }

    /// Appends a record unless its location is already present.
    pub fn push(&mut self, record: TranslationRecord) -> bool {
        if self.by_location.contains_key(&record.location) {
            return false;
        }
        self.by_location
            .insert(record.location.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, location: &str) -> Option<&TranslationRecord> {
        self.by_location
            .get(location)
            .and_then(|index| self.records.get(*index))
    }

    pub fn records(&self) -> &[TranslationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn translated_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.has_target())
            .count()
    }
}

#[derive(Debug)]
pub struct LoadedStore {
    pub store: TranslationStore,
    pub existed: bool,
    pub issues: RowIssues,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default = "default_store_version")]
    store_version: u32,
    #[serde(default)]
    records: Vec<TranslationRecord>,
}

fn default_store_version() -> u32 {
    STORE_VERSION
}

pub fn load_store(path: &Path) -> Result<LoadedStore> {
    if !path.exists() {
        return Ok(LoadedStore {
            store: TranslationStore::new(),
            existed: false,
            issues: RowIssues::default(),
        });
    }

    let rows = match StoreFormat::from_path(path) {
        StoreFormat::Json => read_json_rows(path)?,
        StoreFormat::Csv => csv_store::read_rows(path)?,
        StoreFormat::Sqlite => {
            let connection = Connection::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            sqlite_store::read_rows(&connection)
                .with_context(|| format!("failed to read store rows from {}", path.display()))?
        }
    };

    let (store, issues) = TranslationStore::from_rows(rows);
    if issues.missing_location > 0 {
        warn!(
            path = %path.display(),
            rows = issues.missing_location,
            "rejected store rows without location"
        );
    }
    if issues.duplicate_location > 0 {
        warn!(
            path = %path.display(),
            rows = issues.duplicate_location,
            "ignored store rows repeating an earlier location"
        );
    }

    Ok(LoadedStore {
        store,
        existed: true,
        issues,
    })
}

pub fn save_store(path: &Path, store: &TranslationStore) -> Result<()> {
    match StoreFormat::from_path(path) {
        StoreFormat::Json => {
            let file = StoreFile {
                store_version: STORE_VERSION,
                records: store.records().to_vec(),
            };
            write_json_pretty(path, &file)
        }
        StoreFormat::Csv => csv_store::write_rows(path, store.records()),
        StoreFormat::Sqlite => {
            ensure_parent_directory(path)?;
            let mut connection = Connection::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            sqlite_store::ensure_schema(&connection)?;
            sqlite_store::replace_rows(&mut connection, store.records())
                .with_context(|| format!("failed to write store rows to {}", path.display()))
        }
    }
}

fn read_json_rows(path: &Path) -> Result<Vec<TranslationRecord>> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file: StoreFile = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse translation store {}", path.display()))?;
    Ok(file.records)
}
