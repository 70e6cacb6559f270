use anyhow::{Result, bail};

use super::{ScoreRequest, ScoreResult, ScoringEngine, SlotScore};
use crate::commands::tables::{SCORE_CAP, SCORE_FLOOR};
use crate::guide::slot::SlotId;
use crate::model::{BisTables, PhaseTable};

/// Score shown for a full-BiS character, per raid phase.
pub const PHASE_TARGETS: [(u8, u32); 5] = [(1, 1800), (2, 2600), (3, 3200), (4, 3800), (5, 4400)];

pub fn phase_target(phase: u8) -> u32 {
    PHASE_TARGETS
        .iter()
        .find(|(number, _)| *number == phase)
        .map(|(_, target)| *target)
        .unwrap_or(PHASE_TARGETS[0].1)
}

fn slot_weight(slot_id: SlotId) -> f64 {
    match slot_id {
        SlotId::MainHand => 1.5,
        SlotId::Head | SlotId::Chest | SlotId::Legs => 1.0,
        SlotId::Shoulder | SlotId::Trinket1 | SlotId::Trinket2 => 0.9,
        SlotId::Hands | SlotId::Waist | SlotId::Feet | SlotId::OffHand => 0.8,
        SlotId::Neck | SlotId::Back | SlotId::Finger1 | SlotId::Finger2 => 0.7,
        SlotId::Wrist => 0.6,
        SlotId::Ranged => 0.5,
    }
}

/// Linear factor from the cap at rank 1 down to the floor at the last rank.
pub fn ranked_factor(position: usize, ranked_len: usize) -> f64 {
    let steps = ranked_len.saturating_sub(1).max(1) as f64;
    SCORE_CAP - (SCORE_CAP - SCORE_FLOOR) * (position.saturating_sub(1) as f64) / steps
}

/// Scores equipment against the ranked item lists of the BiS tables. Slots
/// the tables leave empty do not count.
pub struct RankedTableScorer<'a> {
    tables: &'a BisTables,
}

impl<'a> RankedTableScorer<'a> {
    pub fn new(tables: &'a BisTables) -> Self {
        Self { tables }
    }
}

impl ScoringEngine for RankedTableScorer<'_> {
    fn score(&self, request: &ScoreRequest<'_>) -> Result<ScoreResult> {
        let Some(profile) = self
            .tables
            .classes
            .get(request.class.as_str())
            .and_then(|profiles| profiles.get(request.profile))
        else {
            bail!(
                "no tables for class={} profile={}",
                request.class,
                request.profile
            );
        };
        let empty = PhaseTable::default();
        let table = profile.phases.get(&request.phase).unwrap_or(&empty);

        let mut result = ScoreResult {
            score: 0,
            max_score: phase_target(request.phase),
            percent: 0.0,
            sum_score: 0.0,
            sum_max: 0.0,
            bis_slot_count: 0,
            total_slots: 0,
            details: Default::default(),
        };

        for slot_id in SlotId::ALL {
            let Some(ranked) = table.slots.get(&slot_id.id()).filter(|ranked| !ranked.is_empty())
            else {
                continue;
            };
            let equipped = request
                .equipment
                .get(&slot_id)
                .filter(|item| item.item_id > 0);

            let (factor, label) = match equipped {
                None => (0.0, "Empty".to_string()),
                Some(item) => match ranked.iter().position(|id| *id == item.item_id) {
                    Some(0) => (SCORE_CAP, "BiS".to_string()),
                    Some(index) => (
                        ranked_factor(index + 1, ranked.len()),
                        format!("Rank {}/{}", index + 1, ranked.len()),
                    ),
                    None => (SCORE_FLOOR, "Unranked".to_string()),
                },
            };
            if label == "BiS" {
                result.bis_slot_count += 1;
            }

            let stat_value = equipped
                .map(|item| {
                    item.stats
                        .iter()
                        .filter_map(|(token, value)| table.weights.get(token).map(|w| w * value))
                        .sum::<f64>()
                })
                .unwrap_or(0.0);

            let phase_scalar = 1.0;
            let weight = slot_weight(slot_id);
            let slot_max = weight * phase_scalar;
            let slot_score = factor * slot_max;

            result.sum_score += slot_score;
            result.sum_max += slot_max;
            result.total_slots += 1;
            result.details.insert(
                slot_id.id(),
                SlotScore {
                    slot: slot_id.label().to_string(),
                    item_id: equipped.map(|item| item.item_id),
                    item_name: equipped.and_then(|item| item.name.clone()),
                    label,
                    factor,
                    phase_scalar,
                    slot_weight: weight,
                    slot_score,
                    slot_max,
                    stat_value,
                },
            );
        }

        if result.sum_max > 0.0 {
            result.percent = result.sum_score / result.sum_max;
            result.score = (result.percent * f64::from(result.max_score)).round() as u32;
        }

        Ok(result)
    }
}
