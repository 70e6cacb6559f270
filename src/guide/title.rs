use std::fmt;

use anyhow::{Context, Result};
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::slot::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "PRE_RAID")]
    PreRaid,
    P1,
    P2,
    P3,
    P4,
    P5,
    /// Gem and enchant guides apply to every phase.
    #[serde(rename = "ALL")]
    All,
}

impl Phase {
    /// Progression phases in merge order.
    pub const PROGRESSION: [Phase; 6] = [
        Phase::PreRaid,
        Phase::P1,
        Phase::P2,
        Phase::P3,
        Phase::P4,
        Phase::P5,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::PreRaid => "PRE_RAID",
            Phase::P1 => "P1",
            Phase::P2 => "P2",
            Phase::P3 => "P3",
            Phase::P4 => "P4",
            Phase::P5 => "P5",
            Phase::All => "ALL",
        }
    }

    pub fn from_number(number: u8) -> Option<Phase> {
        match number {
            1 => Some(Phase::P1),
            2 => Some(Phase::P2),
            3 => Some(Phase::P3),
            4 => Some(Phase::P4),
            5 => Some(Phase::P5),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GuideType {
    Bis,
    #[value(name = "gems_enchants")]
    GemsEnchants,
}

impl GuideType {
    pub fn as_str(self) -> &'static str {
        match self {
            GuideType::Bis => "bis",
            GuideType::GemsEnchants => "gems_enchants",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideTitle {
    pub spec: String,
    pub phase: Phase,
    pub guide_type: GuideType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClassToken {
    Druid,
    Hunter,
    Mage,
    Paladin,
    Priest,
    Rogue,
    Shaman,
    Warlock,
    Warrior,
}

impl ClassToken {
    pub const ALL: [ClassToken; 9] = [
        ClassToken::Druid,
        ClassToken::Hunter,
        ClassToken::Mage,
        ClassToken::Paladin,
        ClassToken::Priest,
        ClassToken::Rogue,
        ClassToken::Shaman,
        ClassToken::Warlock,
        ClassToken::Warrior,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClassToken::Druid => "DRUID",
            ClassToken::Hunter => "HUNTER",
            ClassToken::Mage => "MAGE",
            ClassToken::Paladin => "PALADIN",
            ClassToken::Priest => "PRIEST",
            ClassToken::Rogue => "ROGUE",
            ClassToken::Shaman => "SHAMAN",
            ClassToken::Warlock => "WARLOCK",
            ClassToken::Warrior => "WARRIOR",
        }
    }

    /// Lowercase class name, also the data file stem.
    pub fn slug(self) -> &'static str {
        match self {
            ClassToken::Druid => "druid",
            ClassToken::Hunter => "hunter",
            ClassToken::Mage => "mage",
            ClassToken::Paladin => "paladin",
            ClassToken::Priest => "priest",
            ClassToken::Rogue => "rogue",
            ClassToken::Shaman => "shaman",
            ClassToken::Warlock => "warlock",
            ClassToken::Warrior => "warrior",
        }
    }

    pub fn from_name(name: &str) -> Option<ClassToken> {
        let lowered = name.trim().to_ascii_lowercase();
        ClassToken::ALL
            .into_iter()
            .find(|class| class.slug() == lowered)
    }

    /// Slot a class fills in its ranged/relic position.
    pub fn relic_slot(self) -> Slot {
        match self {
            ClassToken::Druid => Slot::Idols,
            ClassToken::Shaman => Slot::Totems,
            ClassToken::Paladin => Slot::Librams,
            _ => Slot::Ranged,
        }
    }
}

impl fmt::Display for ClassToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class and addon profile derived from a guide spec name such as
/// "Beast Mastery Hunter DPS".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecProfile {
    pub class: ClassToken,
    pub profile: String,
    /// Key into the stat-weight file, e.g. `hunter_beast_mastery`.
    pub spec_key: String,
}

const ROLE_WORDS: &[&str] = &["dps", "healing", "healer", "tank"];

pub fn class_for_spec(spec: &str) -> Option<ClassToken> {
    spec.split_whitespace().find_map(ClassToken::from_name)
}

pub fn spec_profile(spec: &str) -> Option<SpecProfile> {
    let words = spec.split_whitespace().collect::<Vec<&str>>();
    let class_index = words
        .iter()
        .position(|word| ClassToken::from_name(word).is_some())?;
    let class = ClassToken::from_name(words[class_index])?;

    let profile_words = &words[..class_index];
    if profile_words.is_empty() {
        return None;
    }
    let role = words[class_index + 1..]
        .iter()
        .find(|word| ROLE_WORDS.contains(&word.to_ascii_lowercase().as_str()))
        .map(|word| word.to_ascii_lowercase());

    let base = profile_words.join(" ");
    let base_slug = profile_words
        .iter()
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<String>>()
        .join("_");

    let (profile, spec_key) = if class == ClassToken::Druid && base.eq_ignore_ascii_case("feral")
    {
        if role.as_deref() == Some("tank") {
            ("Feral (Bear)".to_string(), "druid_feral_tank".to_string())
        } else {
            ("Feral (Cat)".to_string(), "druid_feral_dps".to_string())
        }
    } else {
        (base, format!("{}_{}", class.slug(), base_slug))
    };

    Some(SpecProfile {
        class,
        profile,
        spec_key,
    })
}

/// Class-wide gem & enchant guides apply to each of that class's specs.
pub fn expand_spec_targets(spec: &str, guide_type: GuideType) -> Vec<String> {
    if guide_type != GuideType::GemsEnchants {
        return vec![spec.to_string()];
    }

    let targets: &[&str] = match spec {
        "Warlock DPS" => &[
            "Affliction Warlock DPS",
            "Demonology Warlock DPS",
            "Destruction Warlock DPS",
        ],
        "Mage DPS" => &["Arcane Mage DPS", "Fire Mage DPS", "Frost Mage DPS"],
        "Hunter DPS" => &[
            "Beast Mastery Hunter DPS",
            "Marksmanship Hunter DPS",
            "Survival Hunter DPS",
        ],
        "Priest DPS" => &["Shadow Priest DPS"],
        "Warrior DPS" => &["Arms Warrior DPS", "Fury Warrior DPS"],
        _ => return vec![spec.to_string()],
    };

    targets.iter().map(|value| value.to_string()).collect()
}

/// Infers `(spec, phase, guide_type)` from saved guide page names.
pub struct TitleParser {
    classic_phase: Regex,
    spec_phase: Regex,
    pre_patch: Regex,
    role_lead: Regex,
    role_word: Regex,
    raid_bt: Regex,
    raid_hyjal: Regex,
    raid_za: Regex,
    raid_swp: Regex,
    pre_raid: Regex,
    gems_enchants: Regex,
}

impl TitleParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            classic_phase: Regex::new(
                r"^Burning Crusade Classic (.+?) Best in Slot \(BiS\) Phase ([1-5])",
            )
            .context("failed to compile classic phase title regex")?,
            spec_phase: Regex::new(r"^(.+?) Phase ([1-5]) Best in Slot \(BiS\)")
                .context("failed to compile spec phase title regex")?,
            pre_patch: Regex::new(r"(?i)^(.+?) Pre-Patch Best in Slot")
                .context("failed to compile pre-patch title regex")?,
            role_lead: Regex::new(r"(?i)^(.+?) (?:DPS|Healing|Healer|Tank)")
                .context("failed to compile role lead regex")?,
            role_word: Regex::new(r"(?i)(DPS|Healing|Healer|Tank)")
                .context("failed to compile role word regex")?,
            raid_bt: Regex::new(r"(?i)\bbt\b").context("failed to compile bt regex")?,
            raid_hyjal: Regex::new(r"(?i)hyjal").context("failed to compile hyjal regex")?,
            raid_za: Regex::new(r"(?i)\bza\b|zul-aman").context("failed to compile za regex")?,
            raid_swp: Regex::new(r"(?i)\bswp\b|sunwell|phase 5")
                .context("failed to compile sunwell regex")?,
            pre_raid: Regex::new(r"(?i)^(.+?) Pre-Raid Best(?: in |-in-)?Slot \(BiS\)")
                .context("failed to compile pre-raid title regex")?,
            gems_enchants: Regex::new(r"(?i)^(?:TBC )?(.+?) Gems (?:&|and) Enchants Guide")
                .context("failed to compile gems title regex")?,
        })
    }

    pub fn parse(&self, filename: &str) -> Option<GuideTitle> {
        let name = filename
            .strip_suffix(" - Wowhead.html")
            .or_else(|| filename.strip_suffix(".html"))
            .unwrap_or(filename)
            .trim();
        let lowered = name.to_lowercase();

        let bis = |spec: &str, phase: Phase| {
            Some(GuideTitle {
                spec: spec.trim().to_string(),
                phase,
                guide_type: GuideType::Bis,
            })
        };

        for pattern in [&self.classic_phase, &self.spec_phase] {
            if let Some(captures) = pattern.captures(name) {
                let spec = captures.get(1)?.as_str();
                let phase = captures
                    .get(2)?
                    .as_str()
                    .parse::<u8>()
                    .ok()
                    .and_then(Phase::from_number)?;
                return bis(spec, phase);
            }
        }

        if let Some(captures) = self.pre_patch.captures(name) {
            return bis(captures.get(1)?.as_str(), Phase::P1);
        }

        if lowered.contains("best in slot")
            && let Some(title) = self.parse_role_title(name, &lowered)
        {
            return Some(title);
        }

        if let Some(captures) = self.pre_raid.captures(name) {
            return bis(captures.get(1)?.as_str(), Phase::PreRaid);
        }

        if let Some(captures) = self.gems_enchants.captures(name) {
            return Some(GuideTitle {
                spec: captures.get(1)?.as_str().trim().to_string(),
                phase: Phase::All,
                guide_type: GuideType::GemsEnchants,
            });
        }

        None
    }

    /// Titles such as "Holy Paladin Healer Karazhan Best in Slot".
    fn parse_role_title(&self, name: &str, lowered: &str) -> Option<GuideTitle> {
        let lead = self.role_lead.captures(name)?.get(1)?.as_str().trim();
        let role = self.role_word.captures(name)?.get(1)?.as_str();
        let role = if role.eq_ignore_ascii_case("healer") {
            "Healing"
        } else {
            role
        };
        let spec = format!("{lead} {role}");

        let phase = if lowered.contains("karazhan") {
            Phase::P1
        } else if lowered.contains("phase 2") {
            Phase::P2
        } else if self.raid_bt.is_match(lowered) && self.raid_hyjal.is_match(lowered) {
            Phase::P3
        } else if self.raid_za.is_match(lowered) {
            Phase::P4
        } else if self.raid_swp.is_match(lowered) {
            Phase::P5
        } else {
            return None;
        };

        Some(GuideTitle {
            spec,
            phase,
            guide_type: GuideType::Bis,
        })
    }
}
