use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::hash::Hash;

use super::extract::RankedItemEntry;
use super::slot::{SectionTarget, SlotId};
use super::title::Phase;

pub type SlotItemMap = BTreeMap<SectionTarget, Vec<RankedItemEntry>>;
pub type SlotIdMap = BTreeMap<SlotId, Vec<u32>>;

/// Current items first, then prior items not already present. Keys whose
/// merged list is empty do not appear in the result.
pub fn merge_ranked<K, T, I, F>(
    prior: &BTreeMap<K, Vec<T>>,
    current: &BTreeMap<K, Vec<T>>,
    identity: F,
) -> BTreeMap<K, Vec<T>>
where
    K: Ord + Clone,
    T: Clone,
    I: Eq + Hash,
    F: Fn(&T) -> I,
{
    let keys = prior.keys().chain(current.keys()).collect::<BTreeSet<&K>>();
    let mut merged = BTreeMap::new();

    for key in keys {
        let mut seen = HashSet::new();
        let ordered = current
            .get(key)
            .into_iter()
            .flatten()
            .chain(prior.get(key).into_iter().flatten())
            .filter(|item| seen.insert(identity(*item)))
            .cloned()
            .collect::<Vec<T>>();
        if !ordered.is_empty() {
            merged.insert(key.clone(), ordered);
        }
    }

    merged
}

pub fn merge_slot_items(prior: &SlotItemMap, current: &SlotItemMap) -> SlotItemMap {
    merge_ranked(prior, current, RankedItemEntry::identity)
}

pub fn merge_slot_ids(prior: &SlotIdMap, current: &SlotIdMap) -> SlotIdMap {
    merge_ranked(prior, current, |item_id| *item_id)
}

/// Folds per-phase maps in progression order. Phases without a guide get no
/// entry; the next present phase merges onto the last present one.
pub fn merge_phase_chain(phases: &BTreeMap<Phase, SlotItemMap>) -> BTreeMap<Phase, SlotItemMap> {
    let mut merged = BTreeMap::new();
    let mut previous = SlotItemMap::new();

    for phase in Phase::PROGRESSION {
        let Some(current) = phases.get(&phase) else {
            continue;
        };
        previous = merge_slot_items(&previous, current);
        merged.insert(phase, previous.clone());
    }

    merged
}

/// Item ids per numeric slot. Spell references carry no item and are
/// skipped; several named slots feeding one id append without duplicates.
pub fn project_numeric(slots: &SlotItemMap) -> SlotIdMap {
    let mut numeric = SlotIdMap::new();

    for (target, entries) in slots {
        let Some(slot) = target.slot() else {
            continue;
        };
        for slot_id in slot.slot_ids() {
            let ranked = numeric.entry(*slot_id).or_default();
            for item_id in entries.iter().filter_map(|entry| entry.item_id) {
                if !ranked.contains(&item_id) {
                    ranked.push(item_id);
                }
            }
        }
    }

    numeric.retain(|_, ranked| !ranked.is_empty());
    numeric
}

/// Raid phases 1..=5 of numeric tables. Phase 1 falls back to the pre-raid
/// guide when there is no phase 1 guide; a phase whose merged map is empty
/// is left out and does not reset the chain.
pub fn build_numeric_phases(phases: &BTreeMap<Phase, SlotItemMap>) -> BTreeMap<u8, SlotIdMap> {
    let mut tables = BTreeMap::new();
    let mut previous = SlotIdMap::new();

    for number in 1..=5u8 {
        let Some(phase) = Phase::from_number(number) else {
            continue;
        };
        let source = phases
            .get(&phase)
            .or_else(|| (phase == Phase::P1).then(|| phases.get(&Phase::PreRaid)).flatten());
        let current = source.map(project_numeric).unwrap_or_default();

        let merged = if number > 1 {
            merge_slot_ids(&previous, &current)
        } else {
            current
        };
        if !merged.is_empty() {
            tables.insert(number, merged.clone());
            previous = merged;
        }
    }

    tables
}
