use super::*;

const REPORT_VERSION: u32 = 1;

pub fn run(args: BuildArgs) -> Result<()> {
    let started_ts = Utc::now();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    info!(
        run_id = %run_id,
        template = %args.template.display(),
        store = %args.store.display(),
        "starting build"
    );

    let loaded = load_store(&args.store)?;
    if !loaded.existed {
        warn!(
            path = %args.store.display(),
            "translation store missing, writing the template unchanged"
        );
    }

    let index = ContentIndex::build(&loaded.store)?;
    if loaded.existed && index.is_empty() {
        warn!(
            path = %args.store.display(),
            "translation store has no translated rows"
        );
    }
    let index_counts = index.counts();
    info!(
        keys = index.len(),
        rows = index_counts.store_rows,
        rows_with_target = index_counts.rows_with_target,
        entries = index_counts.index_entries,
        collisions_ignored = index_counts.collisions_ignored,
        "built content index"
    );

    let mut document = load_block_document(&args.template)?;
    let counts = reinject(&mut document, &index)?;
    write_block_document(&args.out, &document)?;

    info!(
        path = %args.out.display(),
        paragraphs_changed = counts.paragraphs_changed,
        paragraphs_total = counts.paragraphs_total,
        cells_changed_full = counts.cells_changed_full,
        cells_changed_paragraph = counts.cells_changed_paragraph,
        cells_total = counts.cells_total,
        "wrote translated document"
    );

    if let Some(report_path) = &args.report_path {
        let report = BuildRunReport {
            report_version: REPORT_VERSION,
            run_id,
            generated_at: now_utc_string(),
            template_path: args.template.display().to_string(),
            template_sha256: sha256_file(&args.template)?,
            store_path: args.store.display().to_string(),
            output_path: args.out.display().to_string(),
            store_found: loaded.existed,
            index: index_counts,
            reinjection: counts,
        };
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote build report");
    }

    Ok(())
}
