use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::{info, warn};

use crate::cli::IngestArgs;
use crate::commands::inventory;
use crate::guide::GuideParser;
use crate::guide::coverage::{CoverageRules, DataTypesDetected, expected_slots, missing_expected_slots};
use crate::guide::extract::SlotRanking;
use crate::guide::merge::merge_phase_chain;
use crate::guide::slot::Slot;
use crate::guide::title::{GuideType, Phase, class_for_spec};
use crate::model::{
    BatchManifest, CoverageSummary, GuideEntry, GuideInventoryManifest, GuideRecord,
    IngestCounts, IngestPaths, IngestRunManifest, MergedSpecRecord, PhaseCoverageRow,
    spec_phase_maps,
};
use crate::util::{
    ensure_directory, now_utc_string, read_json, read_page, utc_compact_string, write_json_pretty,
    write_text,
};

const DB_SCHEMA_VERSION: &str = "0.1.0";

mod db_setup;
mod report;
mod run;

pub use run::{default_batch_path, default_db_path, run};

use db_setup::*;
use report::*;
