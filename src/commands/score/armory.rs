use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;

use super::EquippedItem;
use crate::guide::slot::SlotId;

const API_STAT_TYPE_MAP: &[(&str, &str)] = &[
    ("STRENGTH", "ITEM_MOD_STRENGTH_SHORT"),
    ("AGILITY", "ITEM_MOD_AGILITY_SHORT"),
    ("STAMINA", "ITEM_MOD_STAMINA_SHORT"),
    ("INTELLECT", "ITEM_MOD_INTELLECT_SHORT"),
    ("SPIRIT", "ITEM_MOD_SPIRIT_SHORT"),
    ("HIT_RATING", "ITEM_MOD_HIT_RATING_SHORT"),
    ("CRIT_RATING", "ITEM_MOD_CRIT_RATING_SHORT"),
    ("HASTE_RATING", "ITEM_MOD_HASTE_RATING_SHORT"),
    ("EXPERTISE_RATING", "ITEM_MOD_EXPERTISE_RATING_SHORT"),
    ("DODGE_RATING", "ITEM_MOD_DODGE_RATING_SHORT"),
    ("DEFENSE_SKILL_RATING", "ITEM_MOD_DEFENSE_SKILL_RATING_SHORT"),
    ("BLOCK_RATING", "ITEM_MOD_BLOCK_RATING_SHORT"),
    ("BLOCK_VALUE", "ITEM_MOD_BLOCK_VALUE_SHORT"),
    ("ATTACK_POWER", "ITEM_MOD_ATTACK_POWER_SHORT"),
    ("RANGED_ATTACK_POWER", "ITEM_MOD_RANGED_ATTACK_POWER_SHORT"),
    ("FERAL_ATTACK_POWER", "ITEM_MOD_FERAL_ATTACK_POWER_SHORT"),
    ("RESILIENCE_RATING", "RESILIENCE_RATING"),
    ("HIT_SPELL_RATING", "ITEM_MOD_SPELL_HIT_RATING_SHORT"),
    ("CRIT_SPELL_RATING", "ITEM_MOD_SPELL_CRIT_RATING_SHORT"),
    ("HASTE_SPELL_RATING", "ITEM_MOD_SPELL_HASTE_RATING_SHORT"),
    ("MANA_REGENERATION", "ITEM_MOD_MANA_REGENERATION_SHORT"),
];

const SPELL_POWER: &str = "ITEM_MOD_SPELL_POWER_SHORT";

/// Saved armory responses: the character record and its equipment list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmorySnapshot {
    #[serde(default)]
    pub character: ArmoryCharacter,
    #[serde(default)]
    pub equipment: Vec<ArmoryEquipment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmoryCharacter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeTag {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmoryStat {
    #[serde(rename = "type")]
    pub kind: Option<TypeTag>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmorySpell {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceItem {
    pub id: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmoryEnchantment {
    pub display_string: Option<String>,
    pub source_item: Option<SourceItem>,
}

/// One equipment record. List fields may be absent or null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmoryEquipment {
    pub item_id: Option<u32>,
    pub name: Option<String>,
    pub slot_type: Option<String>,
    pub slot: Option<TypeTag>,
    pub stats: Option<Vec<ArmoryStat>>,
    pub spells: Option<Vec<ArmorySpell>>,
    pub enchantments: Option<Vec<ArmoryEnchantment>>,
}

impl ArmoryEquipment {
    fn slot_token(&self) -> Option<&str> {
        self.slot_type
            .as_deref()
            .or_else(|| self.slot.as_ref().and_then(|slot| slot.kind.as_deref()))
    }
}

/// Armory character page coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterLocator {
    pub url: String,
    pub region: String,
    pub flavor: String,
    pub realm: String,
    pub name: String,
}

/// Accepts `<scheme>://<host>/character/<region>/<flavor>/<realm>/<name>` or
/// the bare `character/...` path.
pub fn parse_character_url(url: &str) -> Result<CharacterLocator> {
    let (has_scheme, rest) = match url.split_once("://") {
        Some((_, rest)) => (true, rest),
        None => (false, url),
    };
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let path = if has_scheme {
        rest.split_once('/').map(|(_, path)| path).unwrap_or_default()
    } else {
        rest
    };
    let parts = path
        .split('/')
        .filter(|part| !part.is_empty())
        .collect::<Vec<&str>>();

    if parts.len() < 5 || parts[0] != "character" {
        bail!("unsupported character URL: {url}");
    }

    Ok(CharacterLocator {
        url: url.to_string(),
        region: parts[1].to_string(),
        flavor: parts[2].to_string(),
        realm: parts[3].to_string(),
        name: parts[4].to_string(),
    })
}

/// Converts armory equipment into scoring inputs.
pub struct ArmoryTranslator {
    spell_power: Regex,
    healing: Regex,
    spell_damage: Regex,
    attack_power: Regex,
    ranged_attack_power: Regex,
    feral_attack_power: Regex,
    mana_regen: Regex,
    enchant_hint: Regex,
}

impl ArmoryTranslator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            spell_power: Regex::new(
                r"(?i)increases (?:damage and healing done by magical spells and effects|healing done by spells and effects and damage done by spells and effects) by up to (\d+)",
            )
            .context("failed to compile spell power regex")?,
            healing: Regex::new(r"(?i)increases healing done by up to (\d+)")
                .context("failed to compile healing regex")?,
            spell_damage: Regex::new(r"(?i)damage done by up to (\d+)")
                .context("failed to compile spell damage regex")?,
            attack_power: Regex::new(r"(?i)increases attack power by (\d+)")
                .context("failed to compile attack power regex")?,
            ranged_attack_power: Regex::new(r"(?i)increases ranged attack power by (\d+)")
                .context("failed to compile ranged attack power regex")?,
            feral_attack_power: Regex::new(
                r"(?i)increases attack power in cat, bear, and dire bear forms only by (\d+)",
            )
            .context("failed to compile feral attack power regex")?,
            mana_regen: Regex::new(r"(?i)restores (\d+) mana per 5 sec")
                .context("failed to compile mana regen regex")?,
            enchant_hint: Regex::new(r"(?i)\+(\d+)\s+(Stamina|Agility|Strength|Defense)")
                .context("failed to compile enchant hint regex")?,
        })
    }

    /// Records whose slot token is unknown are dropped; a later record for
    /// the same slot replaces an earlier one.
    pub fn equipment_by_slot(&self, equipment: &[ArmoryEquipment]) -> BTreeMap<SlotId, EquippedItem> {
        equipment
            .iter()
            .filter_map(|record| {
                let slot_id = SlotId::from_slot_type(record.slot_token()?)?;
                let item = EquippedItem {
                    item_id: record.item_id.unwrap_or(0),
                    name: record.name.clone(),
                    stats: self.item_stats(record),
                };
                Some((slot_id, item))
            })
            .collect()
    }

    pub fn item_stats(&self, record: &ArmoryEquipment) -> BTreeMap<String, f64> {
        let mut stats = BTreeMap::new();

        for stat in record.stats.iter().flatten() {
            let stat_type = stat
                .kind
                .as_ref()
                .and_then(|tag| tag.kind.as_deref())
                .unwrap_or_default()
                .to_ascii_uppercase();
            if let Some((_, token)) = API_STAT_TYPE_MAP.iter().find(|(name, _)| *name == stat_type) {
                add_stat(&mut stats, token, stat.value.unwrap_or(0.0));
            }
        }

        for (token, value) in self.spell_stat_hints(record) {
            add_stat(&mut stats, &token, value);
        }

        // Enchants with a source item need that item's tooltip; only the
        // display-string form is read here.
        for enchant in record.enchantments.iter().flatten() {
            if enchant.source_item.as_ref().and_then(|item| item.id).is_some() {
                continue;
            }
            let display = enchant.display_string.as_deref().unwrap_or_default();
            for (token, value) in self.enchant_hints(display) {
                add_stat(&mut stats, token, value);
            }
        }

        stats
    }

    /// Stats granted through "Equip:" spell descriptions.
    pub fn spell_stat_hints(&self, record: &ArmoryEquipment) -> BTreeMap<String, f64> {
        let mut hints = BTreeMap::new();

        for spell in record.spells.iter().flatten() {
            let description = spell.description.as_deref().unwrap_or_default().trim();
            if description.is_empty() {
                continue;
            }

            if let Some(value) = first_number(&self.spell_power, description) {
                add_stat(&mut hints, SPELL_POWER, value);
            }
            if let Some(value) = first_number(&self.healing, description) {
                add_stat(&mut hints, "ITEM_MOD_HEALING_DONE_SHORT", value);
            }
            if !hints.contains_key(SPELL_POWER)
                && let Some(value) = first_number(&self.spell_damage, description)
            {
                add_stat(&mut hints, SPELL_POWER, value);
            }
            if let Some(value) = first_number(&self.attack_power, description) {
                add_stat(&mut hints, "ITEM_MOD_ATTACK_POWER_SHORT", value);
            }
            if let Some(value) = first_number(&self.ranged_attack_power, description) {
                add_stat(&mut hints, "ITEM_MOD_RANGED_ATTACK_POWER_SHORT", value);
            }
            if let Some(value) = first_number(&self.feral_attack_power, description) {
                add_stat(&mut hints, "ITEM_MOD_FERAL_ATTACK_POWER_SHORT", value);
            }
            if let Some(value) = first_number(&self.mana_regen, description) {
                add_stat(&mut hints, "ITEM_MOD_MANA_REGENERATION_SHORT", value);
            }
        }

        hints
    }

    /// First `+N Stat` of each kind in an enchant display string.
    pub fn enchant_hints(&self, display: &str) -> Vec<(&'static str, f64)> {
        let mut seen = BTreeSet::new();
        let mut hints = Vec::new();

        for captures in self.enchant_hint.captures_iter(display) {
            let (Some(value), Some(stat)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            let token = match stat.as_str().to_ascii_lowercase().as_str() {
                "stamina" => "ITEM_MOD_STAMINA_SHORT",
                "agility" => "ITEM_MOD_AGILITY_SHORT",
                "strength" => "ITEM_MOD_STRENGTH_SHORT",
                _ => "ITEM_MOD_DEFENSE_SKILL_RATING_SHORT",
            };
            let Ok(value) = value.as_str().parse::<f64>() else {
                continue;
            };
            if seen.insert(token) {
                hints.push((token, value));
            }
        }

        hints
    }
}

fn first_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)?
        .get(1)?
        .as_str()
        .parse::<f64>()
        .ok()
}

fn add_stat(stats: &mut BTreeMap<String, f64>, token: &str, value: f64) {
    *stats.entry(token.to_string()).or_insert(0.0) += value;
}
