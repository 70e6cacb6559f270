use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::classify::classify_heading;
use super::merge::{SlotIdMap, SlotItemMap, merge_slot_ids, project_numeric};
use super::slot::{SectionTarget, Slot, SlotId};
use super::title::{ClassToken, GuideType, Phase};

/// Armor and jewelry slots every bis guide should rank.
const ARMOR_SLOTS: [Slot; 12] = [
    Slot::Head,
    Slot::Neck,
    Slot::Shoulders,
    Slot::Back,
    Slot::Chest,
    Slot::Wrist,
    Slot::Hands,
    Slot::Waist,
    Slot::Legs,
    Slot::Feet,
    Slot::Rings,
    Slot::Trinkets,
];

/// Slots a final-phase table must always fill.
pub const CORE_SLOT_IDS: [SlotId; 6] = [
    SlotId::Head,
    SlotId::Shoulder,
    SlotId::Chest,
    SlotId::Legs,
    SlotId::Hands,
    SlotId::MainHand,
];

const SINGLETON_RATIO: f64 = 0.6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypesDetected {
    pub gems: bool,
    pub enchants: bool,
    pub stat_weights: bool,
    pub overrides: bool,
}

impl DataTypesDetected {
    pub fn union(self, other: DataTypesDetected) -> DataTypesDetected {
        DataTypesDetected {
            gems: self.gems || other.gems,
            enchants: self.enchants || other.enchants,
            stat_weights: self.stat_weights || other.stat_weights,
            overrides: self.overrides || other.overrides,
        }
    }
}

pub struct CoverageRules {
    slot_hint: Regex,
    gems: Regex,
    enchants: Regex,
    stat_weights: Regex,
    overrides: Regex,
}

impl CoverageRules {
    pub fn new() -> Result<Self> {
        Ok(Self {
            slot_hint: Regex::new(
                r"(?i)(head|helm|shoulder|back|cloak|chest|wrist|bracer|hand|glove|waist|belt|leg|feet|boot|neck|ring|trinket|weapon|off[- ]?hand|main[- ]?hand|ranged|totem|idol|libram)",
            )
            .context("failed to compile slot hint regex")?,
            gems: Regex::new(r"(?i)\bgems?\b").context("failed to compile gems regex")?,
            enchants: Regex::new(r"(?i)\benchants?\b")
                .context("failed to compile enchants regex")?,
            stat_weights: Regex::new(r"(?i)stat (weights?|priority|scaling)")
                .context("failed to compile stat weights regex")?,
            overrides: Regex::new(
                r"(?i)\b(overrides?|special (?:items?|cases?)|procs?)\b",
            )
            .context("failed to compile overrides regex")?,
        })
    }

    /// Toc headings that read like gear but fed none of the parsed targets.
    pub fn detect_slot_like_unparsed(
        &self,
        headings: &[String],
        parsed: &BTreeSet<SectionTarget>,
        guide_type: GuideType,
    ) -> Vec<String> {
        let unparsed = headings
            .iter()
            .filter(|heading| self.slot_hint.is_match(heading))
            .filter(|heading| {
                !classify_heading(heading, "", guide_type)
                    .iter()
                    .any(|target| parsed.contains(target))
            })
            .cloned()
            .collect::<BTreeSet<String>>();
        unparsed.into_iter().collect()
    }

    pub fn detect_data_types(&self, headings: &[String], guide_type: GuideType) -> DataTypesDetected {
        let joined = headings.join("\n");
        let mut detected = DataTypesDetected {
            gems: self.gems.is_match(&joined),
            enchants: self.enchants.is_match(&joined),
            stat_weights: self.stat_weights.is_match(&joined),
            overrides: self.overrides.is_match(&joined),
        };
        if guide_type == GuideType::GemsEnchants {
            detected.gems = true;
            detected.enchants = true;
        }
        detected
    }
}

/// Armor slots, a main hand and the class's ranged or relic slot. Without a
/// known class the plain Ranged slot is expected.
pub fn expected_slots(class: Option<ClassToken>) -> Vec<Slot> {
    let relic = class.map(ClassToken::relic_slot).unwrap_or(Slot::Ranged);
    let mut slots = ARMOR_SLOTS.to_vec();
    slots.push(Slot::MainHand);
    slots.push(relic);
    slots
}

/// A generic Weapons list fills the main hand.
pub fn missing_expected_slots(parsed: &BTreeSet<SectionTarget>, class: Option<ClassToken>) -> Vec<Slot> {
    expected_slots(class)
        .into_iter()
        .filter(|slot| {
            let satisfied = parsed.contains(&SectionTarget::Slot(*slot))
                || (*slot == Slot::MainHand
                    && parsed.contains(&SectionTarget::Slot(Slot::Weapons)));
            !satisfied
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    MissingPhaseGuide,
    EmptyPhaseParse,
    LowSlotCoverage,
    ManySingletonSlots,
    MissingCoreSlotsP5,
    SlotDropBetweenPhases,
    RankedItemDropBetweenPhases,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingKind::MissingPhaseGuide => "missing_phase_guide",
            FindingKind::EmptyPhaseParse => "empty_phase_parse",
            FindingKind::LowSlotCoverage => "low_slot_coverage",
            FindingKind::ManySingletonSlots => "many_singleton_slots",
            FindingKind::MissingCoreSlotsP5 => "missing_core_slots_p5",
            FindingKind::SlotDropBetweenPhases => "slot_drop_between_phases",
            FindingKind::RankedItemDropBetweenPhases => "ranked_item_drop_between_phases",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub phase: u8,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuditThresholds {
    pub min_slot_count: usize,
    pub max_slot_drop: usize,
    pub max_rank_drop_pct: f64,
}

impl Default for AuditThresholds {
    fn default() -> Self {
        Self {
            min_slot_count: 14,
            max_slot_drop: 2,
            max_rank_drop_pct: 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PhaseShape {
    slots: usize,
    ranked: usize,
    singletons: usize,
}

fn phase_shape(map: &SlotIdMap) -> PhaseShape {
    PhaseShape {
        slots: map.len(),
        ranked: map.values().map(Vec::len).sum(),
        singletons: map.values().filter(|ranked| ranked.len() <= 1).count(),
    }
}

/// Suspicious patterns in one spec's numeric phase tables. `phases` holds
/// the textual slot maps of the guides that exist; a guide that failed to
/// parse is present with an empty map.
pub fn audit_phase_maps(
    phases: &BTreeMap<Phase, SlotItemMap>,
    thresholds: &AuditThresholds,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut merged_by_phase: BTreeMap<u8, SlotIdMap> = BTreeMap::new();
    let mut previous = SlotIdMap::new();

    for number in 1..=5u8 {
        let Some(phase) = Phase::from_number(number) else {
            continue;
        };
        let source = phases
            .get(&phase)
            .or_else(|| (phase == Phase::P1).then(|| phases.get(&Phase::PreRaid)).flatten());
        let Some(source) = source else {
            findings.push(Finding {
                severity: Severity::High,
                kind: FindingKind::MissingPhaseGuide,
                phase: number,
                detail: "No guide found for this phase".to_string(),
            });
            continue;
        };

        let mut current = project_numeric(source);
        if number > 1 {
            current = merge_slot_ids(&previous, &current);
        }
        let shape = phase_shape(&current);

        if shape.slots == 0 {
            findings.push(Finding {
                severity: Severity::High,
                kind: FindingKind::EmptyPhaseParse,
                phase: number,
                detail: "0 parsed slots".to_string(),
            });
        } else if shape.slots < thresholds.min_slot_count {
            findings.push(Finding {
                severity: Severity::Medium,
                kind: FindingKind::LowSlotCoverage,
                phase: number,
                detail: format!("{} slots (< {})", shape.slots, thresholds.min_slot_count),
            });
        }

        if shape.slots > 0 && shape.singletons as f64 / shape.slots as f64 >= SINGLETON_RATIO {
            findings.push(Finding {
                severity: Severity::Low,
                kind: FindingKind::ManySingletonSlots,
                phase: number,
                detail: format!(
                    "{}/{} slots have only 1 ranked item",
                    shape.singletons, shape.slots
                ),
            });
        }

        if phase == Phase::P5 {
            let missing = CORE_SLOT_IDS
                .iter()
                .filter(|slot_id| !current.contains_key(*slot_id))
                .map(|slot_id| slot_id.id().to_string())
                .collect::<Vec<String>>();
            if !missing.is_empty() {
                findings.push(Finding {
                    severity: Severity::Medium,
                    kind: FindingKind::MissingCoreSlotsP5,
                    phase: number,
                    detail: format!("Missing core slots in P5: [{}]", missing.join(", ")),
                });
            }
        }

        merged_by_phase.insert(number, current.clone());
        previous = current;
    }

    for number in 2..=5u8 {
        let (Some(prior), Some(current)) = (
            merged_by_phase.get(&(number - 1)),
            merged_by_phase.get(&number),
        ) else {
            continue;
        };
        if prior.is_empty() || current.is_empty() {
            continue;
        }
        let prior = phase_shape(prior);
        let current = phase_shape(current);

        if prior.slots.saturating_sub(current.slots) > thresholds.max_slot_drop {
            findings.push(Finding {
                severity: Severity::Medium,
                kind: FindingKind::SlotDropBetweenPhases,
                phase: number,
                detail: format!("Slots dropped {} -> {}", prior.slots, current.slots),
            });
        }

        if prior.ranked > 0 {
            let drop = (prior.ranked as f64 - current.ranked as f64) / prior.ranked as f64;
            if drop > thresholds.max_rank_drop_pct {
                findings.push(Finding {
                    severity: Severity::Medium,
                    kind: FindingKind::RankedItemDropBetweenPhases,
                    phase: number,
                    detail: format!(
                        "Ranked items dropped {} -> {} ({:.1}%)",
                        prior.ranked,
                        current.ranked,
                        drop * 100.0
                    ),
                });
            }
        }
    }

    findings
}
