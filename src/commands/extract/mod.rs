use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::{ExtractArgs, SegmentMode, StoreFormat};
use crate::document::{Block, DocumentReader, TableCell, load_block_document};
use crate::manifest::{Anchor, AnchorType, Manifest, SectionDescriptor, load_manifest};
use crate::model::{
    ExtractCounts, ExtractPaths, ExtractRunReport, Item, ItemKind, SectionRangeEntry, Unit,
};
use crate::store::{MergeOutcome, TranslationStore, load_store, merge_upsert, save_store};
use crate::text::{
    char_len, join_hard_wrapped_lines, key_digest, normalize_block_text,
    normalize_case_insensitive,
};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

mod anchors;
mod block_stream;
mod ranges;
mod run;
mod segment;
#[cfg(test)]
mod tests;

pub use block_stream::{HeadingRules, StreamOptions, TableFormat, build_stream};
pub use ranges::compute_ranges;
pub use run::run;

use anchors::*;
use ranges::*;
use segment::*;
