use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::guide::slot::SlotId;
use crate::guide::title::ClassToken;

mod armory;
mod engine;
mod run;

pub use run::run;

/// Item worn in one numeric slot, with its stat contributions keyed by
/// item-mod token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquippedItem {
    pub item_id: u32,
    pub name: Option<String>,
    pub stats: BTreeMap<String, f64>,
}

/// Request envelope handed to a scoring engine.
pub struct ScoreRequest<'a> {
    pub class: ClassToken,
    pub profile: &'a str,
    pub phase: u8,
    pub equipment: &'a BTreeMap<SlotId, EquippedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotScore {
    pub slot: String,
    pub item_id: Option<u32>,
    pub item_name: Option<String>,
    pub label: String,
    /// Item quality in the slot, between 0 and the scoring cap.
    pub factor: f64,
    pub phase_scalar: f64,
    pub slot_weight: f64,
    pub slot_score: f64,
    pub slot_max: f64,
    /// Stat weights applied to the item's stats.
    pub stat_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u32,
    pub max_score: u32,
    pub percent: f64,
    pub sum_score: f64,
    pub sum_max: f64,
    pub bis_slot_count: usize,
    pub total_slots: usize,
    /// Keyed by numeric slot id.
    pub details: BTreeMap<u8, SlotScore>,
}

/// Trait implemented by gear scoring engines.
pub trait ScoringEngine {
    fn score(&self, request: &ScoreRequest<'_>) -> Result<ScoreResult>;
}
