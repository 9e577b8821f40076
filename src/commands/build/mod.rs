use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::cli::BuildArgs;
use crate::document::{
    Block, CellAddress, DocumentReader, DocumentWriter, TableCell, load_block_document,
    write_block_document,
};
use crate::model::{BuildRunReport, IndexCounts, ReinjectCounts};
use crate::store::{TranslationStore, load_store};
use crate::text::{CONTENT_HASH_HEX_LEN, content_hash, normalize};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

mod content_index;
mod reinject;
mod run;

pub use content_index::{ContentIndex, MatchOutcome};
pub use reinject::reinject;
pub use run::run;
