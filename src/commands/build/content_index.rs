use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The whole normalized text hashed to a stored translation.
    Whole,
    /// At least one line of a multi-line text was substituted.
    Lines,
    Unmatched,
}

impl MatchOutcome {
    pub fn is_match(self) -> bool {
        self != Self::Unmatched
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated {
    pub text: String,
    pub outcome: MatchOutcome,
}

impl Translated {
    fn unmatched(text: &str) -> Self {
        Self {
            text: text.to_string(),
            outcome: MatchOutcome::Unmatched,
        }
    }
}

/// Read-only lookup from content hash to translated text.
///
/// Insertion is first-writer-wins: a hash that already has an entry keeps it,
/// and the later row only bumps `collisions_ignored`.
#[derive(Debug, Default)]
pub struct ContentIndex {
    by_hash: BTreeMap<String, String>,
    rows: usize,
    rows_with_target: usize,
    collisions_ignored: usize,
}

impl ContentIndex {
    pub fn build(store: &TranslationStore) -> Result<Self> {
        let hash_suffix = Regex::new(&format!("^[0-9a-f]{{{CONTENT_HASH_HEX_LEN}}}$"))
            .context("failed to compile location hash suffix regex")?;

        let mut index = Self {
            rows: store.len(),
            ..Self::default()
        };

        for record in store.records() {
            if !record.has_target() {
                continue;
            }
            index.rows_with_target += 1;

            let suffix = record
                .location
                .trim()
                .rsplit('.')
                .next()
                .unwrap_or_default();
            if hash_suffix.is_match(suffix) {
                index.insert_if_absent(suffix.to_string(), &record.target);
            }

            if !normalize(&record.source).is_empty() {
                index.insert_if_absent(content_hash(&record.source), &record.target);
            }
        }

        Ok(index)
    }

    fn insert_if_absent(&mut self, hash: String, target: &str) {
        if self.by_hash.contains_key(&hash) {
            self.collisions_ignored += 1;
            return;
        }
        self.by_hash.insert(hash, target.to_string());
    }

    pub fn lookup(&self, hash: &str) -> Option<&str> {
        self.by_hash.get(hash).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn counts(&self) -> IndexCounts {
        IndexCounts {
            store_rows: self.rows,
            rows_with_target: self.rows_with_target,
            index_entries: self.by_hash.len(),
            collisions_ignored: self.collisions_ignored,
        }
    }

    /// Looks up the whole text first, then each line of a multi-line text.
    ///
    /// Lines without a translation keep their normalized source text; nothing
    /// is ever blanked. Unmatched input comes back unchanged.
    pub fn translate(&self, text: &str) -> Translated {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Translated::unmatched(text);
        }

        if let Some(target) = self.lookup(&content_hash(&normalized)) {
            return Translated {
                text: target.to_string(),
                outcome: MatchOutcome::Whole,
            };
        }

        if !normalized.contains('\n') {
            return Translated::unmatched(text);
        }

        let mut substituted = false;
        let lines = normalized
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    return line.to_string();
                }
                match self.lookup(&content_hash(line)) {
                    Some(target) => {
                        substituted = true;
                        target.to_string()
                    }
                    None => line.to_string(),
                }
            })
            .collect::<Vec<String>>();

        if substituted {
            Translated {
                text: lines.join("\n"),
                outcome: MatchOutcome::Lines,
            }
        } else {
            Translated::unmatched(text)
        }
    }
}
