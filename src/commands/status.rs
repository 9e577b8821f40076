use std::collections::BTreeMap;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store::{TranslationRecord, load_store};

pub fn run(args: StatusArgs) -> Result<()> {
    info!(stores = args.stores.len(), "status requested");

    for path in &args.stores {
        let loaded = load_store(path)?;
        if !loaded.existed {
            warn!(path = %path.display(), "translation store missing");
            continue;
        }

        let rows = loaded.store.len();
        let translated = loaded.store.translated_count();
        info!(
            path = %path.display(),
            rows,
            translated,
            untranslated = rows - translated,
            rejected = loaded.issues.total(),
            "translation store status"
        );

        for (kind, (rows, translated)) in counts_by_kind(loaded.store.records()) {
            info!(
                path = %path.display(),
                kind = %kind,
                rows,
                translated,
                "context kind status"
            );
        }
    }

    Ok(())
}

/// Row and translated counts keyed by the kind segment of `context`
/// (`section|kind|...`).
fn counts_by_kind(records: &[TranslationRecord]) -> BTreeMap<String, (usize, usize)> {
    let mut counts = BTreeMap::<String, (usize, usize)>::new();
    for record in records {
        let kind = record
            .context
            .split('|')
            .nth(1)
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .unwrap_or("unknown");
        let entry = counts.entry(kind.to_string()).or_default();
        entry.0 += 1;
        if record.has_target() {
            entry.1 += 1;
        }
    }
    counts
}
