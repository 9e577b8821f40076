use super::*;

const REPORT_VERSION: u32 = 1;

#[derive(Debug)]
pub struct Extraction {
    pub ranges: RangeSet,
    pub units: Vec<Unit>,
    pub units_by_section: Vec<(String, usize)>,
    /// Importable sections that could not be located.
    pub missing_sections: Vec<String>,
    /// Importable sections that resolved to a range without items.
    pub empty_sections: Vec<String>,
}

/// Source and target store locations of one extraction.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl StorePaths {
    pub fn new(
        store_dir: &Path,
        source_lang: &str,
        target_lang: &str,
        format: StoreFormat,
    ) -> Self {
        Self {
            source: store_dir.join(store_file_name(source_lang, format)),
            target: store_dir.join(store_file_name(target_lang, format)),
        }
    }
}

#[derive(Debug)]
pub struct ExtractOutcome {
    pub stream: Vec<Item>,
    pub extraction: Extraction,
    pub merge: MergeOutcome,
    pub source_rows: usize,
    pub rejected_store_rows: usize,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest = load_manifest(&args.manifest)?;
    let stream_options = resolve_stream_options(&manifest, &args);
    let segment_options = resolve_segment_options(&manifest, &args);
    let paths = StorePaths::new(
        &args.store_dir,
        &args.source_lang,
        &args.target_lang,
        args.store_format,
    );

    info!(
        run_id = %run_id,
        document = %args.document.display(),
        manifest = %args.manifest.display(),
        mode = segment_options.mode.as_str(),
        sections = manifest.sections.len(),
        "starting extraction"
    );

    let document = load_block_document(&args.document)?;
    let outcome = extract_to_stores(
        &document,
        &manifest,
        &stream_options,
        &segment_options,
        &paths,
    )
    .with_context(|| format!("extraction failed for {}", args.document.display()))?;
    let extraction = &outcome.extraction;

    let mut warnings = Vec::<String>::new();
    let order_violations = extraction.ranges.order_violations();
    for section_id in &order_violations {
        warn!(section = %section_id, "section anchor resolved out of manifest order");
        warnings.push(format!(
            "section '{section_id}' starts before a section declared ahead of it"
        ));
    }
    for (start, section_ids) in extraction.ranges.shared_starts() {
        warn!(
            index = start,
            sections = %section_ids.join(", "),
            "several sections resolved to the same item"
        );
        warnings.push(format!(
            "sections {} share start item {}",
            section_ids.join(", "),
            start
        ));
    }
    for section_id in &extraction.empty_sections {
        warn!(section = %section_id, "importable section resolved to an empty range");
        warnings.push(format!("section '{section_id}' has no items"));
    }
    for section_id in &extraction.missing_sections {
        warn!(section = %section_id, "could not locate anchor for importable section");
        warnings.push(format!("anchor not found for section '{section_id}'"));
    }
    for section_id in &extraction.ranges.unresolved {
        if !extraction.missing_sections.contains(section_id) {
            debug!(section = %section_id, "anchor not found for non-importable section");
        }
    }

    if let Some(report_path) = &args.report_path {
        let (headings, tables) = stream_counts(&outcome.stream);
        let units_by_section = extraction
            .units_by_section
            .iter()
            .cloned()
            .collect::<HashMap<String, usize>>();
        let report = ExtractRunReport {
            report_version: REPORT_VERSION,
            run_id,
            generated_at: now_utc_string(),
            mode: segment_options.mode.as_str().to_string(),
            paths: ExtractPaths {
                document_path: args.document.display().to_string(),
                document_sha256: sha256_file(&args.document)?,
                manifest_path: args.manifest.display().to_string(),
                source_store_path: paths.source.display().to_string(),
                target_store_path: paths.target.display().to_string(),
            },
            counts: ExtractCounts {
                items: outcome.stream.len(),
                headings,
                tables,
                sections_declared: manifest.sections.len(),
                sections_resolved: extraction.ranges.ranges.len(),
                sections_imported: extraction.units_by_section.len(),
                units: extraction.units.len(),
                preserved_targets: outcome.merge.preserved,
                new_keys: outcome.merge.new_keys,
                dropped_keys: outcome.merge.dropped,
                rejected_store_rows: outcome.rejected_store_rows,
            },
            ranges: extraction
                .ranges
                .ranges
                .iter()
                .map(|range| SectionRangeEntry {
                    section_id: range.section_id.clone(),
                    start: range.start,
                    end: range.end,
                    units: units_by_section
                        .get(&range.section_id)
                        .copied()
                        .unwrap_or(0),
                })
                .collect(),
            missing_sections: extraction.missing_sections.clone(),
            unresolved_sections: extraction.ranges.unresolved.clone(),
            empty_sections: extraction.empty_sections.clone(),
            order_violations,
            warnings,
        };
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote extraction report");
    }

    info!(
        units = extraction.units.len(),
        source_rows = outcome.source_rows,
        missing = extraction.missing_sections.len(),
        "extraction completed"
    );

    Ok(())
}

/// Extracts units from `document` and writes the source and target stores.
///
/// Every check runs before the first write: an empty document, an unreadable
/// prior store or a duplicate unit key leave both store files untouched.
pub fn extract_to_stores<R>(
    document: &R,
    manifest: &Manifest,
    stream_options: &StreamOptions,
    segment_options: &SegmentOptions,
    paths: &StorePaths,
) -> Result<ExtractOutcome>
where
    R: DocumentReader + ?Sized,
{
    if document.blocks().is_empty() {
        bail!("source document has no blocks");
    }

    let rules = HeadingRules::new()?;
    let stream = build_stream(document, stream_options, &rules);
    let (headings, tables) = stream_counts(&stream);
    info!(items = stream.len(), headings, tables, "built block stream");

    let extraction = extract_units(&stream, manifest, segment_options)?;

    let prior = load_store(&paths.target)?;
    if !prior.existed {
        info!(
            path = %paths.target.display(),
            "no prior target store, starting untranslated"
        );
    }

    let merge = merge_upsert(&extraction.units, &prior.store);
    let source_store = TranslationStore::from_units(&extraction.units);

    save_store(&paths.source, &source_store)?;
    info!(
        path = %paths.source.display(),
        rows = source_store.len(),
        "wrote source store"
    );
    save_store(&paths.target, &merge.store)?;
    info!(
        path = %paths.target.display(),
        rows = merge.store.len(),
        preserved = merge.preserved,
        new_keys = merge.new_keys,
        dropped = merge.dropped,
        "wrote target store"
    );

    Ok(ExtractOutcome {
        stream,
        extraction,
        merge,
        source_rows: source_store.len(),
        rejected_store_rows: prior.issues.total(),
    })
}

/// Resolves ranges and segments every importable section of the manifest.
pub fn extract_units(
    stream: &[Item],
    manifest: &Manifest,
    options: &SegmentOptions,
) -> Result<Extraction> {
    let ranges = compute_ranges(stream, &manifest.sections);
    let mut context = SegmentContext::default();
    let mut units = Vec::<Unit>::new();
    let mut units_by_section = Vec::<(String, usize)>::new();
    let mut missing_sections = Vec::<String>::new();
    let mut empty_sections = Vec::<String>::new();

    for section in manifest.importable_sections() {
        let Some(range) = ranges.get(&section.id) else {
            missing_sections.push(section.id.clone());
            continue;
        };
        if range.is_empty() {
            empty_sections.push(section.id.clone());
        }

        let section_units = segment_section(section, stream, range, options, &mut context);
        debug!(
            section = %section.id,
            start = range.start,
            end = range.end,
            items = range.len(),
            units = section_units.len(),
            "segmented section"
        );
        units_by_section.push((section.id.clone(), section_units.len()));
        units.extend(section_units);
    }

    ensure_unique_keys(&units)?;

    Ok(Extraction {
        ranges,
        units,
        units_by_section,
        missing_sections,
        empty_sections,
    })
}

fn ensure_unique_keys(units: &[Unit]) -> Result<()> {
    let mut seen = HashSet::<&str>::with_capacity(units.len());
    for unit in units {
        if !seen.insert(unit.key.as_str()) {
            bail!(
                "unit key '{}' was produced more than once in this batch",
                unit.key
            );
        }
    }
    Ok(())
}

fn stream_counts(stream: &[Item]) -> (usize, usize) {
    let headings = stream.iter().filter(|item| item.is_heading()).count();
    let tables = stream
        .iter()
        .filter(|item| item.kind == ItemKind::Table)
        .count();
    (headings, tables)
}

fn resolve_stream_options(manifest: &Manifest, args: &ExtractArgs) -> StreamOptions {
    StreamOptions {
        include_tables: manifest.defaults.include_tables && !args.no_tables,
        table_format: TableFormat::parse(&manifest.defaults.table_format),
        table_prefix: manifest.defaults.table_prefix.clone(),
    }
}

fn resolve_segment_options(manifest: &Manifest, args: &ExtractArgs) -> SegmentOptions {
    SegmentOptions {
        mode: args.mode.unwrap_or(manifest.defaults.mode),
        max_chars: args
            .max_chars
            .unwrap_or(manifest.defaults.max_chars_per_chunk),
        min_chars: args
            .min_chars
            .unwrap_or(manifest.defaults.min_chars_per_chunk),
        join_hard_wrapped_lines: manifest.defaults.join_hard_wrapped_lines,
        hash_key_prefix: manifest.defaults.hash_key_prefix.clone(),
    }
}

pub fn store_file_name(lang: &str, format: StoreFormat) -> String {
    format!("{}.{}", lang, format.extension())
}
