use super::*;

/// Rewrites every matched paragraph and table cell of `document` in place.
///
/// Cells are tried as a whole first, by exact hash only. A cell whose whole
/// text has no translation falls back to matching each of its paragraphs on
/// its own.
pub fn reinject<D>(document: &mut D, index: &ContentIndex) -> Result<ReinjectCounts>
where
    D: DocumentReader + DocumentWriter + ?Sized,
{
    let mut counts = ReinjectCounts::default();

    for position in 0..document.blocks().len() {
        let block = document.blocks()[position].clone();
        match block {
            Block::Paragraph { text, .. } => {
                counts.paragraphs_total += 1;
                let translated = index.translate(&text);
                if translated.outcome.is_match() && translated.text != text {
                    document.set_paragraph_text(position, &translated.text)?;
                    counts.paragraphs_changed += 1;
                }
            }
            Block::Table { rows } => {
                for (row, cells) in rows.iter().enumerate() {
                    for (col, cell) in cells.iter().enumerate() {
                        counts.cells_total += 1;
                        let address = CellAddress {
                            block: position,
                            row,
                            col,
                        };
                        reinject_cell(document, index, address, cell, &mut counts)?;
                    }
                }
            }
        }
    }

    debug!(
        paragraphs_changed = counts.paragraphs_changed,
        cells_changed_full = counts.cells_changed_full,
        cells_changed_paragraph = counts.cells_changed_paragraph,
        "reinjection pass finished"
    );

    Ok(counts)
}

fn reinject_cell<D>(
    document: &mut D,
    index: &ContentIndex,
    address: CellAddress,
    cell: &TableCell,
    counts: &mut ReinjectCounts,
) -> Result<()>
where
    D: DocumentWriter + ?Sized,
{
    let whole = full_cell_text(cell);
    if whole.is_empty() {
        return Ok(());
    }

    let translated = index.translate(&whole);
    if translated.outcome == MatchOutcome::Whole && normalize(&translated.text) != whole {
        document.set_cell_text(address, &translated.text)?;
        counts.cells_changed_full += 1;
        return Ok(());
    }

    let mut changed = false;
    for (paragraph, text) in cell.paragraphs.iter().enumerate() {
        let translated = index.translate(text);
        if translated.outcome.is_match() && translated.text != *text {
            document.set_cell_paragraph_text(address, paragraph, &translated.text)?;
            changed = true;
        }
    }
    if changed {
        counts.cells_changed_paragraph += 1;
    }

    Ok(())
}

/// Non-empty normalized paragraphs of a cell, one per line.
pub(super) fn full_cell_text(cell: &TableCell) -> String {
    cell.paragraphs
        .iter()
        .map(|paragraph| normalize(paragraph))
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<String>>()
        .join("\n")
}
