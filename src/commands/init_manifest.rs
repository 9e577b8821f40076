use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::InitManifestArgs;
use crate::commands::extract::{HeadingRules, StreamOptions, build_stream, compute_ranges};
use crate::document::load_block_document;
use crate::manifest::{
    AnchorEntry, AnchorType, ImportSettings, Manifest, ManifestDocument, SectionAction,
    SectionEntry, default_key_prefix,
};
use crate::model::Item;
use crate::text::normalize_case_insensitive;
use crate::util::write_json_pretty;

const FRONT_SECTION_ID: &str = "front";

pub fn run(args: InitManifestArgs) -> Result<()> {
    if args.out.exists() && !args.force {
        bail!(
            "manifest already exists: {} (pass --force to overwrite)",
            args.out.display()
        );
    }

    let document = load_block_document(&args.document)?;
    let options = StreamOptions {
        include_tables: false,
        ..StreamOptions::default()
    };
    let stream = build_stream(&document, &options, &HeadingRules::new()?);

    let (manifest, skipped) = starter_manifest(&stream, args.max_level);
    for heading in &skipped {
        warn!(
            heading = %heading,
            "skipped repeated heading, an earlier heading has the same text"
        );
    }

    let validated = Manifest::from_document(manifest.clone())
        .context("generated manifest failed validation")?;
    let ranges = compute_ranges(&stream, &validated.sections);
    for section_id in &ranges.unresolved {
        warn!(section = %section_id, "generated section does not resolve in its document");
    }
    for range in ranges.ranges.iter().filter(|range| range.is_empty()) {
        warn!(section = %range.section_id, "generated section resolves to an empty range");
    }
    write_json_pretty(&args.out, &manifest)?;

    info!(
        path = %args.out.display(),
        sections = manifest.sections.len(),
        skipped = skipped.len(),
        max_level = args.max_level,
        "wrote starter manifest"
    );

    Ok(())
}

/// One import section per heading up to `max_level`, preceded by a
/// start-of-document section when text comes before the first such heading.
///
/// A heading whose text repeats an earlier heading would anchor at that
/// earlier item, so it gets no section of its own. The texts of the skipped
/// headings are returned alongside the manifest.
pub fn starter_manifest(stream: &[Item], max_level: u8) -> (ManifestDocument, Vec<String>) {
    let mut seen_texts = HashSet::<String>::new();
    let mut skipped = Vec::<String>::new();
    let mut headings = Vec::<(usize, &Item)>::new();
    for (index, item) in stream.iter().enumerate() {
        if !item.is_heading() || item.text.is_empty() {
            continue;
        }
        let first_occurrence = seen_texts.insert(normalize_case_insensitive(&item.text));
        if item.metadata.heading_level.unwrap_or(1) > max_level {
            continue;
        }
        if first_occurrence {
            headings.push((index, item));
        } else {
            skipped.push(item.text.clone());
        }
    }

    let mut used = HashSet::<String>::new();
    let mut sections = Vec::with_capacity(headings.len() + 1);

    if headings.first().is_none_or(|(index, _)| *index > 0) {
        used.insert(FRONT_SECTION_ID.to_string());
        sections.push(import_section(
            FRONT_SECTION_ID.to_string(),
            AnchorEntry {
                kind: Some(AnchorType::StartOfDocument),
                ..AnchorEntry::default()
            },
        ));
    }

    for (_, item) in headings {
        let id = unique_id(&slugify(&item.text), &mut used);
        sections.push(import_section(
            id,
            AnchorEntry {
                kind: Some(AnchorType::HeadingText),
                any_of: vec![item.text.clone()],
                value: None,
            },
        ));
    }

    let manifest = ManifestDocument {
        notes: Some(format!(
            "Starter manifest: one section per heading up to level {max_level}."
        )),
        sections,
        ..ManifestDocument::default()
    };
    (manifest, skipped)
}

fn import_section(id: String, anchor: AnchorEntry) -> SectionEntry {
    SectionEntry {
        import: Some(ImportSettings {
            key_prefix: Some(default_key_prefix(&id)),
        }),
        id,
        action: SectionAction::Import,
        anchor: Some(anchor),
    }
}

/// Lowercase ASCII alphanumerics; every other run of characters becomes one
/// underscore.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

fn unique_id(base: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut suffix = 1usize;
    while used.contains(&candidate) {
        suffix += 1;
        candidate = format!("{base}_{suffix}");
    }
    used.insert(candidate.clone());
    candidate
}
