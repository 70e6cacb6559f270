use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::TablesArgs;
use crate::commands::ingest;
use crate::guide::merge::build_numeric_phases;
use crate::guide::title::{ClassToken, spec_profile};
use crate::model::{BatchManifest, BisTables, PhaseTable, ProfileTables};
use crate::util::{now_utc_string, read_json, write_json_pretty, write_text};

/// Raw stat weights per spec key, as exported by the simulation sheet.
pub type RawWeights = BTreeMap<String, BTreeMap<String, f64>>;

pub const SCORE_FLOOR: f64 = 0.35;
pub const SCORE_CAP: f64 = 1.0;

const WEIGHT_TOKEN_MAP: &[(&str, &str)] = &[
    ("Agility", "ITEM_MOD_AGILITY_SHORT"),
    ("Strength", "ITEM_MOD_STRENGTH_SHORT"),
    ("Stamina", "ITEM_MOD_STAMINA_SHORT"),
    ("Intellect", "ITEM_MOD_INTELLECT_SHORT"),
    ("Spirit", "ITEM_MOD_SPIRIT_SHORT"),
    ("HitRating", "ITEM_MOD_HIT_RATING_SHORT"),
    ("CritRating", "ITEM_MOD_CRIT_RATING_SHORT"),
    ("HasteRating", "ITEM_MOD_HASTE_RATING_SHORT"),
    ("ExpertiseRating", "ITEM_MOD_EXPERTISE_RATING_SHORT"),
    ("DefenseRating", "ITEM_MOD_DEFENSE_SKILL_RATING_SHORT"),
    ("DodgeRating", "ITEM_MOD_DODGE_RATING_SHORT"),
    ("BlockRating", "ITEM_MOD_BLOCK_RATING_SHORT"),
    ("BlockValue", "ITEM_MOD_BLOCK_VALUE_SHORT"),
    ("Ap", "ITEM_MOD_ATTACK_POWER_SHORT"),
    ("Rap", "ITEM_MOD_RANGED_ATTACK_POWER_SHORT"),
    ("FeralAp", "ITEM_MOD_FERAL_ATTACK_POWER_SHORT"),
    ("SpellDamage", "ITEM_MOD_SPELL_POWER_SHORT"),
    ("SpellPower", "ITEM_MOD_SPELL_POWER_SHORT"),
    ("ArcaneSpellDamage", "ITEM_MOD_SPELL_POWER_SHORT"),
    ("FireSpellDamage", "ITEM_MOD_SPELL_POWER_SHORT"),
    ("FrostSpellDamage", "ITEM_MOD_SPELL_POWER_SHORT"),
    ("HolySpellDamage", "ITEM_MOD_SPELL_POWER_SHORT"),
    ("NatureSpellDamage", "ITEM_MOD_SPELL_POWER_SHORT"),
    ("ShadowSpellDamage", "ITEM_MOD_SPELL_POWER_SHORT"),
    ("Healing", "ITEM_MOD_HEALING_DONE_SHORT"),
    ("SpellHitRating", "ITEM_MOD_SPELL_HIT_RATING_SHORT"),
    ("SpellCritRating", "ITEM_MOD_SPELL_CRIT_RATING_SHORT"),
    ("SpellHasteRating", "ITEM_MOD_SPELL_HASTE_RATING_SHORT"),
    ("Mp5", "ITEM_MOD_MANA_REGENERATION_SHORT"),
    ("ResilienceRating", "RESILIENCE_RATING"),
];

pub fn run(args: TablesArgs) -> Result<()> {
    let batch_path = args
        .batch_path
        .clone()
        .unwrap_or_else(|| ingest::default_batch_path(&args.cache_root));
    let lua_dir = args
        .lua_dir
        .clone()
        .unwrap_or_else(|| args.cache_root.join("lua"));
    let tables_path = args
        .tables_path
        .clone()
        .unwrap_or_else(|| default_tables_path(&args.cache_root));

    let batch: BatchManifest = read_json(&batch_path)?;
    let weights: RawWeights = match &args.weights_path {
        Some(path) => read_json(path)?,
        None => {
            warn!("no stat weight file given; tables carry empty weights");
            RawWeights::new()
        }
    };

    let tables = build_tables(&batch, &weights);

    for class in ClassToken::ALL {
        let empty = BTreeMap::new();
        let profiles = tables.classes.get(class.as_str()).unwrap_or(&empty);
        let path = lua_dir.join(format!("{}.lua", class.slug()));
        write_text(&path, &render_class_lua(class, profiles))?;
        info!(path = %path.display(), profiles = profiles.len(), "wrote class data file");
    }

    write_json_pretty(&tables_path, &tables)?;
    info!(path = %tables_path.display(), "wrote bis tables");

    Ok(())
}

pub fn default_tables_path(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests").join("bis_tables.json")
}

/// Token weights; unknown stats and zero weights are dropped and several
/// stats sharing a token keep the largest value.
pub fn map_weights(raw: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let mut mapped: BTreeMap<String, f64> = BTreeMap::new();

    for (stat, value) in raw {
        let Some((_, token)) = WEIGHT_TOKEN_MAP.iter().find(|(name, _)| name == stat) else {
            continue;
        };
        if value.abs() < 1e-9 {
            continue;
        }
        let best = mapped.entry(token.to_string()).or_insert(0.0);
        *best = best.max(*value);
    }

    mapped
}

pub fn build_tables(batch: &BatchManifest, weights: &RawWeights) -> BisTables {
    let mut classes: BTreeMap<String, BTreeMap<String, ProfileTables>> = BTreeMap::new();

    for (spec, phases) in batch.spec_phase_maps() {
        let Some(profile) = spec_profile(&spec) else {
            warn!(spec = %spec, "spec name carries no class and profile");
            continue;
        };

        let numeric = build_numeric_phases(&phases);
        if numeric.is_empty() {
            warn!(spec = %spec, "no ranked items for any raid phase");
            continue;
        }

        let mapped_weights = weights
            .get(&profile.spec_key)
            .map(map_weights)
            .unwrap_or_default();
        if mapped_weights.is_empty() {
            warn!(spec_key = %profile.spec_key, "no stat weights for profile");
        }

        let phases = numeric
            .into_iter()
            .map(|(number, slots)| {
                let table = PhaseTable {
                    slots: slots
                        .into_iter()
                        .map(|(slot_id, ranked)| (slot_id.id(), ranked))
                        .collect(),
                    weights: mapped_weights.clone(),
                };
                (number, table)
            })
            .collect();

        let class_profiles = classes.entry(profile.class.as_str().to_string()).or_default();
        if class_profiles.contains_key(&profile.profile) {
            warn!(spec = %spec, profile = %profile.profile, "profile produced twice; keeping the later spec");
        }
        class_profiles.insert(
            profile.profile,
            ProfileTables {
                spec,
                spec_key: profile.spec_key,
                phases,
            },
        );
    }

    BisTables {
        generated_at: now_utc_string(),
        classes,
    }
}

fn lua_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Addon data file for one class. Phases 1..=5 are always written; a phase
/// without a table gets empty slots and weights.
pub fn render_class_lua(class: ClassToken, profiles: &BTreeMap<String, ProfileTables>) -> String {
    let token = class.as_str();
    let mut lines = vec![
        "BiScoreData = BiScoreData or {}".to_string(),
        format!("BiScoreData[\"{token}\"] = BiScoreData[\"{token}\"] or {{"),
    ];

    let empty = PhaseTable::default();
    for (profile, tables) in profiles {
        lines.push(format!("    [{}] = {{", lua_quote(profile)));
        for phase in 1..=5u8 {
            let table = tables.phases.get(&phase).unwrap_or(&empty);
            lines.push(format!("        [{phase}] = {{"));
            lines.push("            slots = {".to_string());
            for (slot_id, ranked) in &table.slots {
                let items = ranked
                    .iter()
                    .enumerate()
                    .map(|(index, item_id)| format!("[{}] = {item_id}", index + 1))
                    .collect::<Vec<String>>()
                    .join(", ");
                lines.push(format!("                [{slot_id}] = {{ ranked = {{ {items} }} }},"));
            }
            lines.push("            },".to_string());
            lines.push("            weights = {".to_string());
            for (stat, weight) in &table.weights {
                lines.push(format!("                [\"{stat}\"] = {weight:.4},"));
            }
            lines.push("            },".to_string());
            lines.push(format!(
                "            scoring = {{ floor = {SCORE_FLOOR:.2}, cap = {SCORE_CAP:.2} }},"
            ));
            lines.push("        },".to_string());
        }
        lines.push("    },".to_string());
    }

    lines.push("}".to_string());
    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

#[cfg(test)]
mod tests;
