use super::{TranslationRecord, TranslationStore};
use crate::model::Unit;

#[derive(Debug)]
pub struct MergeOutcome {
    pub store: TranslationStore,
    pub preserved: usize,
    pub new_keys: usize,
    pub dropped: usize,
}

/// Combines a fresh extraction with the prior store of the same language.
///
/// Source and context always come from the fresh unit. A non-empty prior
/// target is copied verbatim; everything else starts untranslated. Prior
/// locations that were not extracted again are dropped.
pub fn merge_upsert(fresh: &[Unit], prior: &TranslationStore) -> MergeOutcome {
    let mut store = TranslationStore::new();
    let mut preserved = 0usize;
    let mut new_keys = 0usize;

    for unit in fresh {
        let mut record = TranslationRecord::untranslated(unit);
        match prior.get(&unit.key) {
            Some(previous) => {
                if previous.has_target() {
                    record.target = previous.target.clone();
                    preserved += 1;
                }
            }
            None => new_keys += 1,
        }
        store.push(record);
    }

    let dropped = prior
        .records()
        .iter()
        .filter(|record| store.get(&record.location).is_none())
        .count();

    MergeOutcome {
        store,
        preserved,
        new_keys,
        dropped,
    }
}
