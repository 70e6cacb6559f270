use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::guide::coverage::{DataTypesDetected, Finding};
use crate::guide::error::GuideDiagnostic;
use crate::guide::extract::SlotRanking;
use crate::guide::merge::{SlotItemMap, merge_slot_items};
use crate::guide::slot::Slot;
use crate::guide::title::{GuideType, Phase};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideEntry {
    pub filename: String,
    pub spec: String,
    pub phase: Phase,
    pub guide_type: GuideType,
    pub applies_to_specs: Vec<String>,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub guide_count: usize,
    pub guides: Vec<GuideEntry>,
    /// Pages whose title matched no known guide pattern.
    #[serde(default)]
    pub skipped_files: Vec<String>,
}

/// One guide as written to the batch output. Failed pages keep their
/// metadata with `parse_error` set and no slot data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideRecord {
    pub spec: String,
    pub phase: Phase,
    pub guide_type: GuideType,
    pub applies_to_specs: Vec<String>,
    pub file: String,
    pub sha256: String,
    pub parse_error: Option<String>,
    pub slots: Vec<SlotRanking>,
    pub slot_count: usize,
    pub item_count: usize,
    pub missing_expected_slots: Vec<Slot>,
    pub unparsed_slot_like_headers: Vec<String>,
    pub data_types_detected: DataTypesDetected,
    #[serde(default)]
    pub diagnostics: Vec<GuideDiagnostic>,
}

impl GuideRecord {
    pub fn slot_map(&self) -> SlotItemMap {
        self.slots
            .iter()
            .map(|ranking| (ranking.target, ranking.entries()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseCoverageRow {
    pub spec: String,
    pub phase: Phase,
    pub bis_guide_found: bool,
    pub slot_count: usize,
    pub missing_expected_slots: Vec<Slot>,
    pub missing_data_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub spec_count: usize,
    pub guide_count: usize,
    pub phase_coverage: Vec<PhaseCoverageRow>,
}

/// Cumulative slot lists of one spec, keyed by the phase they apply to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedSpecRecord {
    pub spec: String,
    pub phases: BTreeMap<Phase, SlotItemMap>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub guides: Vec<GuideRecord>,
    pub merged_specs: Vec<MergedSpecRecord>,
    pub coverage: CoverageSummary,
}

impl BatchManifest {
    pub fn spec_phase_maps(&self) -> BTreeMap<String, BTreeMap<Phase, SlotItemMap>> {
        spec_phase_maps(&self.guides)
    }
}

/// Per-phase slot maps of each spec's bis guides. A guide that failed to
/// parse contributes an empty map; several guides for one phase merge with
/// the earlier file's items first.
pub fn spec_phase_maps(guides: &[GuideRecord]) -> BTreeMap<String, BTreeMap<Phase, SlotItemMap>> {
    let mut specs: BTreeMap<String, BTreeMap<Phase, SlotItemMap>> = BTreeMap::new();

    for guide in guides {
        if guide.guide_type != GuideType::Bis || !Phase::PROGRESSION.contains(&guide.phase) {
            continue;
        }
        let map = guide.slot_map();
        let phases = specs.entry(guide.spec.clone()).or_default();
        match phases.get(&guide.phase) {
            Some(existing) => {
                let combined = merge_slot_items(&map, existing);
                phases.insert(guide.phase, combined);
            }
            None => {
                phases.insert(guide.phase, map);
            }
        }
    }

    specs
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestPaths {
    pub cache_root: String,
    pub guides_dir: String,
    pub inventory_manifest_path: String,
    pub batch_path: String,
    pub report_path: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestCounts {
    pub guide_count: usize,
    pub parsed_guide_count: usize,
    pub failed_guide_count: usize,
    pub spec_count: usize,
    pub slot_rows_inserted: usize,
    pub guides_total: i64,
    pub slot_items_total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub source_hashes: Vec<GuideEntry>,
    pub warnings: Vec<String>,
}

/// One class/profile/phase table: ranked item ids per numeric slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTable {
    pub slots: BTreeMap<u8, Vec<u32>>,
    pub weights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileTables {
    pub spec: String,
    pub spec_key: String,
    pub phases: BTreeMap<u8, PhaseTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BisTables {
    pub generated_at: String,
    /// Class token, then profile label.
    pub classes: BTreeMap<String, BTreeMap<String, ProfileTables>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecFindings {
    pub spec: String,
    pub findings: Vec<Finding>,
}
