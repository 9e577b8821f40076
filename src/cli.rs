use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "doc-l10n",
    version,
    about = "Section-aware text extraction and translation re-injection for block documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Extract(ExtractArgs),
    Build(BuildArgs),
    Status(StatusArgs),
    InitManifest(InitManifestArgs),
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentMode {
    #[default]
    Atomic,
    Chunked,
    Hashed,
}

impl SegmentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Atomic => "atomic",
            Self::Chunked => "chunked",
            Self::Hashed => "hashed",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum StoreFormat {
    #[default]
    Json,
    Sqlite,
    Csv,
}

impl StoreFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Sqlite => "sqlite",
            Self::Csv => "csv",
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "sqlite" | "db" => Self::Sqlite,
            "csv" => Self::Csv,
            _ => Self::Json,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub document: PathBuf,

    #[arg(long, default_value = "manifest.json")]
    pub manifest: PathBuf,

    #[arg(long, default_value = "locale/texts")]
    pub store_dir: PathBuf,

    #[arg(long, default_value = "en")]
    pub source_lang: String,

    #[arg(long, default_value = "nl")]
    pub target_lang: String,

    #[arg(long, value_enum)]
    pub mode: Option<SegmentMode>,

    #[arg(long)]
    pub max_chars: Option<usize>,

    #[arg(long)]
    pub min_chars: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub no_tables: bool,

    #[arg(long, value_enum, default_value_t = StoreFormat::Json)]
    pub store_format: StoreFormat,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[arg(long)]
    pub template: PathBuf,

    #[arg(long)]
    pub store: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long = "store", required = true)]
    pub stores: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InitManifestArgs {
    #[arg(long)]
    pub document: PathBuf,

    #[arg(long, default_value = "manifest.json")]
    pub out: PathBuf,

    #[arg(long, default_value_t = 1)]
    pub max_level: u8,

    #[arg(long, default_value_t = false)]
    pub force: bool,
}
