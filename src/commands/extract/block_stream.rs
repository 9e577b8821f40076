use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Tsv,
    Pipe,
}

impl TableFormat {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("tsv") {
            Self::Tsv
        } else {
            Self::Pipe
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::Tsv => "\t",
            Self::Pipe => " | ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamOptions {
    pub include_tables: bool,
    pub table_format: TableFormat,
    pub table_prefix: String,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            include_tables: true,
            table_format: TableFormat::Tsv,
            table_prefix: "TABLE".to_string(),
        }
    }
}

const HEADING_STYLE_PREFIXES: [&str; 4] = ["heading", "kop", "title", "titel"];
const MAX_HEADING_LEVEL: u8 = 9;

#[derive(Debug)]
pub struct HeadingRules {
    level_suffix: Regex,
}

impl HeadingRules {
    pub fn new() -> Result<Self> {
        Ok(Self {
            level_suffix: Regex::new(r"(\d+)$")
                .context("failed to compile heading level regex")?,
        })
    }

    /// Heading level for a paragraph style, or `None` when the style is not a
    /// heading style.
    pub fn heading_level(&self, style: Option<&str>) -> Option<u8> {
        let name = style.map(str::trim).unwrap_or_default().to_lowercase();
        if name.is_empty() {
            return None;
        }
        if !HEADING_STYLE_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
        {
            return None;
        }

        let level = self
            .level_suffix
            .captures(&name)
            .and_then(|captures| captures.get(1))
            .and_then(|value| value.as_str().parse::<u8>().ok())
            .filter(|level| (1..=MAX_HEADING_LEVEL).contains(level))
            .unwrap_or(1);

        Some(level)
    }
}

/// Linearizes the document into items, one per block, in document order.
pub fn build_stream<R>(reader: &R, options: &StreamOptions, rules: &HeadingRules) -> Vec<Item>
where
    R: DocumentReader + ?Sized,
{
    let mut stream = Vec::with_capacity(reader.blocks().len());

    for block in reader.blocks() {
        match block {
            Block::Paragraph { text, style } => {
                let text = normalize_block_text(text);
                let item = match rules.heading_level(style.as_deref()) {
                    Some(level) => Item::heading(text, level),
                    None => Item::paragraph(text),
                };
                stream.push(item);
            }
            Block::Table { rows } => {
                if !options.include_tables {
                    continue;
                }
                let body = table_to_text(rows, options.table_format);
                let text = if body.is_empty() || options.table_prefix.is_empty() {
                    body
                } else {
                    format!("{}:\n{}", options.table_prefix, body)
                };
                let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
                stream.push(Item::table(text, rows.len(), cols));
            }
        }
    }

    stream
}

pub fn table_to_text(rows: &[Vec<TableCell>], format: TableFormat) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(cell_text)
                .collect::<Vec<String>>()
                .join(format.separator())
        })
        .collect::<Vec<String>>()
        .join("\n")
        .trim()
        .to_string()
}

fn cell_text(cell: &TableCell) -> String {
    normalize_block_text(&cell.text())
}
