use super::*;

/// Finds the stream index where a section starts.
///
/// Heading anchors look at heading items first and fall back to every
/// paragraph. The earliest matching item wins; the order of the candidates
/// never changes which item is returned.
pub fn locate(stream: &[Item], anchor: &Anchor) -> Option<usize> {
    let needles = anchor
        .candidates
        .iter()
        .map(|candidate| normalize_case_insensitive(candidate))
        .filter(|candidate| !candidate.is_empty())
        .collect::<Vec<String>>();

    match anchor.kind {
        AnchorType::StartOfDocument => Some(0),
        _ if needles.is_empty() => None,
        AnchorType::HeadingText | AnchorType::HeadingContains => {
            first_match(stream, &needles, anchor.kind, Item::is_heading)
                .or_else(|| first_match(stream, &needles, anchor.kind, |_| true))
        }
        AnchorType::ParagraphContains => first_match(stream, &needles, anchor.kind, |_| true),
    }
}

fn first_match(
    stream: &[Item],
    needles: &[String],
    kind: AnchorType,
    eligible: impl Fn(&Item) -> bool,
) -> Option<usize> {
    stream
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_searchable_paragraph() && eligible(*item))
        .find(|(_, item)| {
            let haystack = normalize_case_insensitive(&item.text);
            needles
                .iter()
                .any(|needle| candidate_matches(kind, &haystack, needle))
        })
        .map(|(index, _)| index)
}

fn candidate_matches(kind: AnchorType, haystack: &str, needle: &str) -> bool {
    match kind {
        AnchorType::HeadingText => haystack == needle,
        AnchorType::HeadingContains | AnchorType::ParagraphContains => haystack.contains(needle),
        AnchorType::StartOfDocument => false,
    }
}
