use super::*;

pub const CHUNK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct SegmentOptions {
    pub mode: SegmentMode,
    pub max_chars: usize,
    pub min_chars: usize,
    pub join_hard_wrapped_lines: bool,
    pub hash_key_prefix: String,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            mode: SegmentMode::Atomic,
            max_chars: 1800,
            min_chars: 200,
            join_hard_wrapped_lines: true,
            hash_key_prefix: "doc".to_string(),
        }
    }
}

/// Per-batch bookkeeping for content-addressed keys.
#[derive(Debug, Default)]
pub struct SegmentContext {
    issued: HashMap<String, usize>,
}

impl SegmentContext {
    /// Returns `key` the first time it is claimed, then `key.1`, `key.2`, ...
    pub fn claim(&mut self, key: String) -> String {
        match self.issued.get_mut(&key) {
            Some(repeats) => {
                *repeats += 1;
                format!("{key}.{repeats}")
            }
            None => {
                self.issued.insert(key.clone(), 0);
                key
            }
        }
    }
}

pub fn segment_section(
    section: &SectionDescriptor,
    stream: &[Item],
    range: &SectionRange,
    options: &SegmentOptions,
    context: &mut SegmentContext,
) -> Vec<Unit> {
    let end = range.end.min(stream.len());
    let start = range.start.min(end);
    let items = &stream[start..end];

    match options.mode {
        SegmentMode::Atomic => atomic_units(section, items, options.join_hard_wrapped_lines),
        SegmentMode::Chunked => {
            let atomic = atomic_units(section, items, options.join_hard_wrapped_lines);
            chunk_units(
                &section.id,
                &section.key_prefix,
                &atomic,
                options.max_chars,
                options.min_chars,
            )
        }
        SegmentMode::Hashed => hashed_units(
            section,
            items,
            &options.hash_key_prefix,
            options.join_hard_wrapped_lines,
            context,
        ),
    }
}

/// One unit per non-empty item, numbered from 1 within the section.
pub fn atomic_units(section: &SectionDescriptor, items: &[Item], join_lines: bool) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut counter = 0usize;

    for item in items {
        let source = unit_source(item, join_lines);
        if source.is_empty() {
            continue;
        }

        counter += 1;
        units.push(Unit {
            key: format!("{}.u{:04}", section.key_prefix, counter),
            context: unit_context(&section.id, item),
            source,
        });
    }

    units
}

/// Coalesces consecutive units into chunks bounded by `max_chars`, never
/// flushing a chunk smaller than `min_chars`.
pub fn chunk_units(
    section_id: &str,
    key_prefix: &str,
    units: &[Unit],
    max_chars: usize,
    min_chars: usize,
) -> Vec<Unit> {
    let mut chunks = Vec::new();
    let mut buffer = Vec::<&str>::new();
    let mut size = 0usize;

    let flush = |buffer: &mut Vec<&str>, size: &mut usize, chunks: &mut Vec<Unit>| {
        if buffer.is_empty() {
            return;
        }
        let source = buffer.join(CHUNK_SEPARATOR).trim().to_string();
        chunks.push(Unit {
            key: format!("{}.p{:03}", key_prefix, chunks.len() + 1),
            context: format!("{section_id}|chunk"),
            source,
        });
        buffer.clear();
        *size = 0;
    };

    for unit in units {
        let text = unit.source.trim();
        if text.is_empty() {
            continue;
        }

        let added = if buffer.is_empty() {
            char_len(text)
        } else {
            char_len(CHUNK_SEPARATOR) + char_len(text)
        };

        if size + added > max_chars && size >= min_chars {
            flush(&mut buffer, &mut size, &mut chunks);
            buffer.push(text);
            size = char_len(text);
        } else {
            buffer.push(text);
            size += added;
        }
    }

    flush(&mut buffer, &mut size, &mut chunks);
    chunks
}

/// One unit per non-empty item, keyed by a digest of section, kind and text.
pub fn hashed_units(
    section: &SectionDescriptor,
    items: &[Item],
    hash_prefix: &str,
    join_lines: bool,
    context: &mut SegmentContext,
) -> Vec<Unit> {
    let mut units = Vec::new();

    for item in items {
        let source = unit_source(item, join_lines);
        if source.is_empty() {
            continue;
        }

        let kind = unit_kind(item);
        let key = format!(
            "{}.{}.{}.{}",
            hash_prefix,
            section.id,
            kind,
            key_digest(&section.id, kind, &source)
        );
        units.push(Unit {
            key: context.claim(key),
            context: unit_context(&section.id, item),
            source,
        });
    }

    units
}

pub fn unit_kind(item: &Item) -> &'static str {
    if item.is_heading() {
        "heading"
    } else {
        item.kind.as_str()
    }
}

pub fn unit_context(section_id: &str, item: &Item) -> String {
    match item.kind {
        ItemKind::Paragraph if item.metadata.is_heading => format!(
            "{}|heading|l{}",
            section_id,
            item.metadata.heading_level.unwrap_or(1)
        ),
        ItemKind::Table => format!("{section_id}|table"),
        ItemKind::Paragraph => format!("{section_id}|paragraph"),
    }
}

/// Table rows keep their line structure; only paragraph text is re-flowed.
fn unit_source(item: &Item, join_lines: bool) -> String {
    let text = item.text.trim();
    if join_lines && item.kind == ItemKind::Paragraph {
        join_hard_wrapped_lines(text)
    } else {
        text.to_string()
    }
}
