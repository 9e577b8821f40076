//! Section manifest: which parts of the document are extracted, and under
//! which key prefix.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::cli::SegmentMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorType {
    StartOfDocument,
    HeadingText,
    HeadingContains,
    ParagraphContains,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionAction {
    Import,
    Export,
    ImportExport,
    #[default]
    Ignore,
}

impl SectionAction {
    pub fn is_importable(self) -> bool {
        matches!(self, Self::Import | Self::ImportExport)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub kind: AnchorType,
    pub candidates: Vec<String>,
}

impl Anchor {
    pub fn new<I, S>(kind: AnchorType, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    #[cfg(test)]
    pub fn start_of_document() -> Self {
        Self {
            kind: AnchorType::StartOfDocument,
            candidates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDescriptor {
    pub id: String,
    pub anchor: Option<Anchor>,
    pub action: SectionAction,
    pub key_prefix: String,
}

impl SectionDescriptor {
    #[cfg(test)]
    pub fn new(id: &str, anchor: Anchor, action: SectionAction) -> Self {
        Self {
            id: id.to_string(),
            anchor: Some(anchor),
            action,
            key_prefix: default_key_prefix(id),
        }
    }
}

pub fn default_key_prefix(section_id: &str) -> String {
    format!("doc.{section_id}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestDefaults {
    pub mode: SegmentMode,
    pub max_chars_per_chunk: usize,
    pub min_chars_per_chunk: usize,
    pub include_tables: bool,
    pub table_format: String,
    pub table_prefix: String,
    pub join_hard_wrapped_lines: bool,
    pub hash_key_prefix: String,
}

impl Default for ManifestDefaults {
    fn default() -> Self {
        Self {
            mode: SegmentMode::Atomic,
            max_chars_per_chunk: 1800,
            min_chars_per_chunk: 200,
            include_tables: true,
            table_format: "tsv".to_string(),
            table_prefix: "TABLE".to_string(),
            join_hard_wrapped_lines: true,
            hash_key_prefix: "doc".to_string(),
        }
    }
}

/// On-disk manifest shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub defaults: ManifestDefaults,
    #[serde(default)]
    pub sections: Vec<SectionEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub action: SectionAction,
    #[serde(default, alias = "docx_anchor", skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AnchorEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnchorEntry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnchorType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl AnchorEntry {
    fn candidates(&self) -> Vec<String> {
        let listed = self
            .any_of
            .iter()
            .filter(|value| !value.trim().is_empty())
            .cloned()
            .collect::<Vec<String>>();
        if !listed.is_empty() {
            return listed;
        }

        self.value
            .iter()
            .filter(|value| !value.trim().is_empty())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
}

/// Validated manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub defaults: ManifestDefaults,
    pub sections: Vec<SectionDescriptor>,
}

impl Manifest {
    pub fn from_document(document: ManifestDocument) -> Result<Self> {
        if document.sections.is_empty() {
            bail!("manifest declares no sections");
        }

        let mut seen_ids = HashSet::<String>::new();
        let mut seen_prefixes = HashSet::<String>::new();
        let mut sections = Vec::with_capacity(document.sections.len());

        for (position, entry) in document.sections.into_iter().enumerate() {
            let id = entry.id.trim().to_string();
            if id.is_empty() {
                bail!("manifest section #{} has no id", position + 1);
            }
            if !seen_ids.insert(id.clone()) {
                bail!("manifest section id '{id}' is declared more than once");
            }

            let key_prefix = entry
                .import
                .as_ref()
                .and_then(|settings| settings.key_prefix.as_deref())
                .map(str::trim)
                .filter(|prefix| !prefix.is_empty())
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| default_key_prefix(&id));

            if entry.action.is_importable() && !seen_prefixes.insert(key_prefix.clone()) {
                bail!("key prefix '{key_prefix}' is shared by more than one importable section");
            }

            let anchor = entry.anchor.as_ref().and_then(|anchor| {
                anchor
                    .kind
                    .map(|kind| Anchor::new(kind, anchor.candidates()))
            });

            sections.push(SectionDescriptor {
                id,
                anchor,
                action: entry.action,
                key_prefix,
            });
        }

        Ok(Self {
            defaults: document.defaults,
            sections,
        })
    }

    pub fn importable_sections(&self) -> impl Iterator<Item = &SectionDescriptor> {
        self.sections
            .iter()
            .filter(|section| section.action.is_importable())
    }
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    if !path.exists() {
        bail!("section manifest not found: {}", path.display());
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let document: ManifestDocument = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse manifest {}", path.display()))?;

    Manifest::from_document(document)
        .with_context(|| format!("invalid manifest {}", path.display()))
}
