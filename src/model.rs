use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Paragraph,
    Table,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Table => "table",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub is_heading: bool,
    pub heading_level: Option<u8>,
    pub rows: Option<usize>,
    pub cols: Option<usize>,
}

/// One linearized block of the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub text: String,
    pub metadata: ItemMetadata,
}

impl Item {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Paragraph,
            text: text.into(),
            metadata: ItemMetadata::default(),
        }
    }

    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self {
            kind: ItemKind::Paragraph,
            text: text.into(),
            metadata: ItemMetadata {
                is_heading: true,
                heading_level: Some(level),
                ..ItemMetadata::default()
            },
        }
    }

    pub fn table(text: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self {
            kind: ItemKind::Table,
            text: text.into(),
            metadata: ItemMetadata {
                rows: Some(rows),
                cols: Some(cols),
                ..ItemMetadata::default()
            },
        }
    }

    pub fn is_heading(&self) -> bool {
        self.kind == ItemKind::Paragraph && self.metadata.is_heading
    }

    pub fn is_searchable_paragraph(&self) -> bool {
        self.kind == ItemKind::Paragraph && !self.text.is_empty()
    }
}

/// A translation unit (atomic) or a chunk of coalesced units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub key: String,
    pub context: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionRangeEntry {
    pub section_id: String,
    pub start: usize,
    pub end: usize,
    pub units: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractPaths {
    pub document_path: String,
    pub document_sha256: String,
    pub manifest_path: String,
    pub source_store_path: String,
    pub target_store_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractCounts {
    pub items: usize,
    pub headings: usize,
    pub tables: usize,
    pub sections_declared: usize,
    pub sections_resolved: usize,
    pub sections_imported: usize,
    pub units: usize,
    pub preserved_targets: usize,
    pub new_keys: usize,
    pub dropped_keys: usize,
    pub rejected_store_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractRunReport {
    pub report_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub mode: String,
    pub paths: ExtractPaths,
    pub counts: ExtractCounts,
    pub ranges: Vec<SectionRangeEntry>,
    pub missing_sections: Vec<String>,
    /// Every section whose anchor matched nothing, whatever its action.
    pub unresolved_sections: Vec<String>,
    pub empty_sections: Vec<String>,
    pub order_violations: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexCounts {
    pub store_rows: usize,
    pub rows_with_target: usize,
    pub index_entries: usize,
    pub collisions_ignored: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReinjectCounts {
    pub paragraphs_total: usize,
    pub paragraphs_changed: usize,
    pub cells_total: usize,
    pub cells_changed_full: usize,
    pub cells_changed_paragraph: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildRunReport {
    pub report_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub template_path: String,
    pub template_sha256: String,
    pub store_path: String,
    pub output_path: String,
    pub store_found: bool,
    pub index: IndexCounts,
    pub reinjection: ReinjectCounts,
}
