use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::guide::title::GuideType;

#[derive(Parser, Debug)]
#[command(
    name = "biscore",
    version,
    about = "Best-in-slot guide extraction, phase tables and gear scoring"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Catalogue saved guide pages and hash them.
    Inventory(InventoryArgs),
    /// Extract one saved page to slot JSON.
    Extract(ExtractArgs),
    /// List the distinct item, spell and enchant ids of saved pages.
    Refs(RefsArgs),
    /// Extract every inventoried guide, merge phases and report coverage.
    Ingest(IngestArgs),
    /// Build numeric BiS tables and the addon Lua data files.
    Tables(TablesArgs),
    /// Flag suspicious phase data for manual review.
    Audit(AuditArgs),
    /// Score a saved armory equipment snapshot.
    Score(ScoreArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/biscore")]
    pub cache_root: PathBuf,

    /// Defaults to `<cache-root>/guides`.
    #[arg(long)]
    pub guides_dir: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    pub input_html: PathBuf,

    /// Output JSON file; stdout when absent.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = GuideType::Bis)]
    pub guide_type: GuideType,

    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RefsArgs {
    #[arg(required = true)]
    pub input_html: Vec<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/biscore")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub guides_dir: Option<PathBuf>,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub batch_path: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long)]
    pub ingest_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TablesArgs {
    #[arg(long, default_value = ".cache/biscore")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub batch_path: Option<PathBuf>,

    /// Stat weights per spec key, e.g. `{"warrior_fury": {"Strength": 1.0}}`.
    #[arg(long)]
    pub weights_path: Option<PathBuf>,

    #[arg(long)]
    pub lua_dir: Option<PathBuf>,

    #[arg(long)]
    pub tables_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AuditArgs {
    #[arg(long, default_value = ".cache/biscore")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub batch_path: Option<PathBuf>,

    #[arg(long, default_value_t = 14)]
    pub min_slot_count: usize,

    #[arg(long, default_value_t = 2)]
    pub max_slot_drop: usize,

    #[arg(long, default_value_t = 0.35)]
    pub max_rank_drop_pct: f64,

    /// Only audit specs of this class, e.g. `paladin`.
    #[arg(long)]
    pub only_class: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[arg(long, default_value = ".cache/biscore")]
    pub cache_root: PathBuf,

    /// Saved armory response: `{"character": {...}, "equipment": [...]}`.
    pub snapshot_path: PathBuf,

    /// Profile label, e.g. `Protection` or `Feral (Bear)`.
    #[arg(long)]
    pub profile: String,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub phase: u8,

    #[arg(long)]
    pub tables_path: Option<PathBuf>,

    /// Armory character page the snapshot came from.
    #[arg(long)]
    pub character_url: Option<String>,

    #[arg(long)]
    pub json_out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/biscore")]
    pub cache_root: PathBuf,
}
