use super::slot::{ENCHANT_ALIASES, GEM_ALIASES, SectionTarget, Slot};
use super::title::GuideType;

const HEADING_WEAPON_CUES: &[&str] = &[
    "weapon",
    "handed",
    "one-hand",
    "one hand",
    "1-hand",
    "1 hand",
    "two-hand",
    "two hand",
    "2-hand",
    "2 hand",
    "main hand",
    "main-hand",
    "mainhand",
    "off-hand",
    "off hand",
    "offhand",
    "dual-wield",
    "dual wield",
];

const BODY_WEAPON_CUES: &[&str] = &[
    "weapon",
    "handed",
    "main hand",
    "main-hand",
    "mainhand",
    "off-hand",
    "off hand",
    "offhand",
    "dual-wield",
    "dual wield",
];

const OFFHAND_CUES: &[&str] = &["off-hand", "off hand", "offhand"];
const MAINHAND_CUES: &[&str] = &["main hand", "main-hand", "mainhand"];
const DUAL_WIELD_CUES: &[&str] = &["dual-wield", "dual wield"];

/// Everything the rule table looks at, computed once per heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingCues {
    pub lowered: String,
    pub alias: Option<Slot>,
    pub hand_word: bool,
    pub glove_word: bool,
    pub heading_weaponish: bool,
    pub body_weaponish: bool,
    pub dual_wield: bool,
    pub offhand: bool,
    pub mainhand: bool,
    pub shield: bool,
}

impl HeadingCues {
    pub fn new(heading: &str, body: &str) -> Self {
        let normalized = normalize_heading(heading);
        let lowered = normalized.to_lowercase();
        let body = body.to_lowercase();

        let alias = Slot::from_alias(&lowered).or_else(|| Slot::parse(&lowered));
        let shield = lowered.contains("shield");

        Self {
            alias,
            hand_word: lowered.contains("hand"),
            glove_word: lowered.contains("glove"),
            heading_weaponish: contains_any(&lowered, HEADING_WEAPON_CUES),
            body_weaponish: contains_any(&body, BODY_WEAPON_CUES),
            dual_wield: contains_any(&lowered, DUAL_WIELD_CUES),
            offhand: shield
                || contains_any(&lowered, OFFHAND_CUES)
                || contains_any(&body, OFFHAND_CUES),
            mainhand: lowered.contains("weapon")
                || contains_any(&lowered, MAINHAND_CUES)
                || contains_any(&body, MAINHAND_CUES),
            shield,
            lowered,
        }
    }

    /// Body text only counts for a bare "hand" heading; "gloves" is never a weapon.
    fn body_decides_weapon(&self) -> bool {
        self.hand_word && !self.glove_word && self.body_weaponish
    }

    fn weapon_section(&self) -> bool {
        self.heading_weaponish || self.shield || self.body_decides_weapon()
    }
}

type Rule = fn(&HeadingCues) -> Option<Vec<SectionTarget>>;

/// Bis guide rules, evaluated top to bottom, first match wins.
pub const RULES: &[(&str, Rule)] = &[
    ("alias", alias_rule),
    ("hands", hands_rule),
    ("ranged_class", ranged_class_rule),
    ("dual_weapon", dual_weapon_rule),
    ("off_hand", off_hand_rule),
    ("main_hand", main_hand_rule),
];

fn alias_rule(cues: &HeadingCues) -> Option<Vec<SectionTarget>> {
    cues.alias.map(|slot| vec![SectionTarget::Slot(slot)])
}

fn hands_rule(cues: &HeadingCues) -> Option<Vec<SectionTarget>> {
    let hand_like = cues.hand_word || cues.glove_word;
    let weaponish = cues.heading_weaponish || cues.body_decides_weapon();
    (hand_like && !weaponish).then(|| vec![SectionTarget::Slot(Slot::Hands)])
}

fn ranged_class_rule(cues: &HeadingCues) -> Option<Vec<SectionTarget>> {
    let text = cues.lowered.as_str();
    let slot = if text.contains("idol") {
        Slot::Idols
    } else if text.contains("totem") {
        Slot::Totems
    } else if text.contains("libram") {
        Slot::Librams
    } else if ["relic", "ranged", "wand"]
        .iter()
        .any(|cue| text.contains(cue))
    {
        Slot::Ranged
    } else {
        return None;
    };
    Some(vec![SectionTarget::Slot(slot)])
}

fn dual_weapon_rule(cues: &HeadingCues) -> Option<Vec<SectionTarget>> {
    let dual = cues.dual_wield || (cues.offhand && cues.mainhand);
    (cues.weapon_section() && dual).then(|| {
        vec![
            SectionTarget::Slot(Slot::MainHand),
            SectionTarget::Slot(Slot::OffHand),
        ]
    })
}

fn off_hand_rule(cues: &HeadingCues) -> Option<Vec<SectionTarget>> {
    (cues.weapon_section() && cues.offhand).then(|| vec![SectionTarget::Slot(Slot::OffHand)])
}

fn main_hand_rule(cues: &HeadingCues) -> Option<Vec<SectionTarget>> {
    cues.weapon_section()
        .then(|| vec![SectionTarget::Slot(Slot::MainHand)])
}

/// Drops a trailing `for <...>` qualifier and collapses whitespace.
pub fn normalize_heading(heading: &str) -> String {
    let words = heading.split_whitespace().collect::<Vec<&str>>();
    let cut = words
        .iter()
        .enumerate()
        .skip(1)
        .find(|(index, word)| word.eq_ignore_ascii_case("for") && index + 1 < words.len())
        .map(|(index, _)| index)
        .unwrap_or(words.len());
    words[..cut].join(" ")
}

/// Name of the first bis rule that fires for a heading, if any.
#[cfg(test)]
pub fn matching_rule(heading: &str, body: &str) -> Option<&'static str> {
    let cues = HeadingCues::new(heading, body);
    RULES
        .iter()
        .find(|(_, rule)| rule(&cues).is_some())
        .map(|(name, _)| *name)
}

/// Maps a section heading to the slots or gem buckets it feeds. An empty
/// result means the section is not slot data.
pub fn classify_heading(heading: &str, body: &str, guide_type: GuideType) -> Vec<SectionTarget> {
    match guide_type {
        GuideType::Bis => classify_slots(heading, body),
        GuideType::GemsEnchants => classify_bucket(heading),
    }
}

pub fn classify_slots(heading: &str, body: &str) -> Vec<SectionTarget> {
    let cues = HeadingCues::new(heading, body);
    RULES
        .iter()
        .find_map(|(_, rule)| rule(&cues))
        .unwrap_or_default()
}

/// Gem colour wins over a per-slot enchant alias for the same heading.
fn classify_bucket(heading: &str) -> Vec<SectionTarget> {
    let lowered = normalize_heading(heading).to_lowercase();

    if let Some((_, color)) = GEM_ALIASES.iter().find(|(alias, _)| *alias == lowered) {
        return vec![SectionTarget::Gem(*color)];
    }
    if let Some((_, slot)) = ENCHANT_ALIASES.iter().find(|(alias, _)| *alias == lowered) {
        return vec![SectionTarget::Slot(*slot)];
    }
    if let Some(slot) = lowered
        .strip_suffix(" enchant")
        .and_then(Slot::from_alias)
    {
        return vec![SectionTarget::Slot(slot)];
    }

    SectionTarget::parse(&lowered).into_iter().collect()
}

fn contains_any(text: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| text.contains(cue))
}
