use super::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionRange {
    pub section_id: String,
    pub start: usize,
    pub end: usize,
}

impl SectionRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Clone, Default)]
pub struct RangeSet {
    /// Resolved sections in document order.
    pub ranges: Vec<SectionRange>,
    /// Sections whose anchor is missing or matched nothing, in manifest order.
    pub unresolved: Vec<String>,
    declared_rank: HashMap<String, usize>,
}

impl RangeSet {
    pub fn get(&self, section_id: &str) -> Option<&SectionRange> {
        self.ranges
            .iter()
            .find(|range| range.section_id == section_id)
    }

    /// Sections found in the document after a section declared later in the
    /// manifest.
    pub fn order_violations(&self) -> Vec<String> {
        let mut highest_rank = None::<usize>;
        let mut violations = Vec::new();

        for range in &self.ranges {
            let rank = self
                .declared_rank
                .get(&range.section_id)
                .copied()
                .unwrap_or(usize::MAX);
            match highest_rank {
                Some(highest) if rank < highest => violations.push(range.section_id.clone()),
                _ => highest_rank = Some(rank),
            }
        }

        violations
    }

    /// Start indices claimed by more than one section.
    pub fn shared_starts(&self) -> BTreeMap<usize, Vec<String>> {
        let mut by_start = BTreeMap::<usize, Vec<String>>::new();
        for range in &self.ranges {
            by_start
                .entry(range.start)
                .or_default()
                .push(range.section_id.clone());
        }
        by_start.retain(|_, ids| ids.len() > 1);
        by_start
    }
}

/// Resolves every anchored section and partitions the stream between them.
///
/// Every section takes part as a boundary, whatever its action: a section
/// ends where the next resolved section starts, or at the end of the stream.
pub fn compute_ranges(stream: &[Item], sections: &[SectionDescriptor]) -> RangeSet {
    let mut starts = Vec::<(usize, String)>::new();
    let mut unresolved = Vec::new();
    let mut declared_rank = HashMap::new();

    for (rank, section) in sections.iter().enumerate() {
        declared_rank.insert(section.id.clone(), rank);
        let index = section
            .anchor
            .as_ref()
            .and_then(|anchor| locate(stream, anchor));
        match index {
            Some(index) => starts.push((index.min(stream.len()), section.id.clone())),
            None => unresolved.push(section.id.clone()),
        }
    }

    starts.sort();

    let ranges = starts
        .iter()
        .enumerate()
        .map(|(position, (start, section_id))| {
            let end = starts
                .get(position + 1)
                .map(|(next_start, _)| *next_start)
                .unwrap_or(stream.len());
            SectionRange {
                section_id: section_id.clone(),
                start: *start,
                end,
            }
        })
        .collect();

    RangeSet {
        ranges,
        unresolved,
        declared_rank,
    }
}
