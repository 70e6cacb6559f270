use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Named equipment slots as guides write them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    Head,
    Neck,
    Shoulders,
    Back,
    Chest,
    Wrist,
    Hands,
    Waist,
    Legs,
    Feet,
    Rings,
    Trinkets,
    #[serde(rename = "Main-Hand")]
    MainHand,
    #[serde(rename = "Off-Hand")]
    OffHand,
    Weapons,
    Ranged,
    Totems,
    Idols,
    Librams,
}

impl Slot {
    pub const ALL: [Slot; 19] = [
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
        Slot::MainHand,
        Slot::OffHand,
        Slot::Weapons,
        Slot::Ranged,
        Slot::Totems,
        Slot::Idols,
        Slot::Librams,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Head => "Head",
            Slot::Neck => "Neck",
            Slot::Shoulders => "Shoulders",
            Slot::Back => "Back",
            Slot::Chest => "Chest",
            Slot::Wrist => "Wrist",
            Slot::Hands => "Hands",
            Slot::Waist => "Waist",
            Slot::Legs => "Legs",
            Slot::Feet => "Feet",
            Slot::Rings => "Rings",
            Slot::Trinkets => "Trinkets",
            Slot::MainHand => "Main-Hand",
            Slot::OffHand => "Off-Hand",
            Slot::Weapons => "Weapons",
            Slot::Ranged => "Ranged",
            Slot::Totems => "Totems",
            Slot::Idols => "Idols",
            Slot::Librams => "Librams",
        }
    }

    pub fn parse(value: &str) -> Option<Slot> {
        Slot::ALL
            .into_iter()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Numeric equipment slots a ranked list for this slot feeds.
    ///
    /// This is the only bridge between the two taxonomies: dual slots fan
    /// out to both ids and every relic-like slot collapses onto 18.
    pub fn slot_ids(self) -> &'static [SlotId] {
        match self {
            Slot::Head => &[SlotId::Head],
            Slot::Neck => &[SlotId::Neck],
            Slot::Shoulders => &[SlotId::Shoulder],
            Slot::Back => &[SlotId::Back],
            Slot::Chest => &[SlotId::Chest],
            Slot::Wrist => &[SlotId::Wrist],
            Slot::Hands => &[SlotId::Hands],
            Slot::Waist => &[SlotId::Waist],
            Slot::Legs => &[SlotId::Legs],
            Slot::Feet => &[SlotId::Feet],
            Slot::Rings => &[SlotId::Finger1, SlotId::Finger2],
            Slot::Trinkets => &[SlotId::Trinket1, SlotId::Trinket2],
            Slot::MainHand | Slot::Weapons => &[SlotId::MainHand],
            Slot::OffHand => &[SlotId::OffHand],
            Slot::Ranged | Slot::Totems | Slot::Idols | Slot::Librams => &[SlotId::Ranged],
        }
    }

    /// Case-insensitive lookup in the heading alias table.
    pub fn from_alias(key: &str) -> Option<Slot> {
        let lowered = key.trim().to_lowercase();
        SLOT_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, slot)| *slot)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SLOT_ALIASES: &[(&str, Slot)] = &[
    ("head", Slot::Head),
    ("neck", Slot::Neck),
    ("shoulder", Slot::Shoulders),
    ("shoulders", Slot::Shoulders),
    ("back", Slot::Back),
    ("chest", Slot::Chest),
    ("wrist", Slot::Wrist),
    ("wrists", Slot::Wrist),
    ("hand", Slot::Hands),
    ("hands", Slot::Hands),
    ("waist", Slot::Waist),
    ("legs", Slot::Legs),
    ("feet", Slot::Feet),
    ("ring", Slot::Rings),
    ("rings", Slot::Rings),
    ("finger", Slot::Rings),
    ("fingers", Slot::Rings),
    ("trinket", Slot::Trinkets),
    ("trinkets", Slot::Trinkets),
    ("weapon", Slot::Weapons),
    ("weapons", Slot::Weapons),
    ("1-handed weapon", Slot::Weapons),
    ("1-handed weapons", Slot::Weapons),
    ("1handed weapon", Slot::Weapons),
    ("1handed weapons", Slot::Weapons),
    ("one-handed weapon", Slot::Weapons),
    ("one-handed weapons", Slot::Weapons),
    ("1h weapons", Slot::MainHand),
    ("2h weapons", Slot::MainHand),
    ("main-hand", Slot::MainHand),
    ("main hand", Slot::MainHand),
    ("main-hands", Slot::MainHand),
    ("off-hand", Slot::OffHand),
    ("off-hands", Slot::OffHand),
    ("off hand", Slot::OffHand),
    ("offhand", Slot::OffHand),
    ("offhands", Slot::OffHand),
    ("offhands and shields", Slot::OffHand),
    ("off-hands and shields", Slot::OffHand),
    ("shields / off-hands", Slot::OffHand),
    ("shields & offhands", Slot::OffHand),
    ("totem", Slot::Totems),
    ("totems", Slot::Totems),
    ("idol", Slot::Idols),
    ("idols", Slot::Idols),
    ("libram", Slot::Librams),
    ("librams", Slot::Librams),
    ("ranged", Slot::Ranged),
];

/// Per-slot enchant headings used by gems & enchants guides.
pub(crate) const ENCHANT_ALIASES: &[(&str, Slot)] = &[
    ("head enchant", Slot::Head),
    ("shoulder enchant", Slot::Shoulders),
    ("cloak enchant", Slot::Back),
    ("chest enchant", Slot::Chest),
    ("bracer enchant", Slot::Wrist),
    ("gloves enchant", Slot::Hands),
    ("legs enchant", Slot::Legs),
    ("leg enchant", Slot::Legs),
    ("boots enchant", Slot::Feet),
    ("weapon enchant", Slot::Weapons),
    ("main-hand enchant", Slot::MainHand),
    ("off-hand enchant", Slot::OffHand),
    ("rings enchant", Slot::Rings),
    ("ring enchant", Slot::Rings),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GemColor {
    Meta,
    Red,
    Yellow,
    Blue,
}

impl GemColor {
    pub fn as_str(self) -> &'static str {
        match self {
            GemColor::Meta => "Meta",
            GemColor::Red => "Red",
            GemColor::Yellow => "Yellow",
            GemColor::Blue => "Blue",
        }
    }
}

pub(crate) const GEM_ALIASES: &[(&str, GemColor)] = &[
    ("best meta", GemColor::Meta),
    ("best meta gems", GemColor::Meta),
    ("meta gem", GemColor::Meta),
    ("meta gems", GemColor::Meta),
    ("best red", GemColor::Red),
    ("best red gems", GemColor::Red),
    ("red gem", GemColor::Red),
    ("red gems", GemColor::Red),
    ("best yellow", GemColor::Yellow),
    ("best yellow gems", GemColor::Yellow),
    ("yellow gem", GemColor::Yellow),
    ("yellow gems", GemColor::Yellow),
    ("best blue", GemColor::Blue),
    ("best blue gems", GemColor::Blue),
    ("blue gem", GemColor::Blue),
    ("blue gems", GemColor::Blue),
];

/// What a classified section feeds: a wearable slot or a gem colour bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionTarget {
    Slot(Slot),
    Gem(GemColor),
}

impl SectionTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionTarget::Slot(slot) => slot.as_str(),
            SectionTarget::Gem(color) => color.as_str(),
        }
    }

    pub fn slot(self) -> Option<Slot> {
        match self {
            SectionTarget::Slot(slot) => Some(slot),
            SectionTarget::Gem(_) => None,
        }
    }

    pub fn parse(value: &str) -> Option<SectionTarget> {
        if let Some(slot) = Slot::parse(value) {
            return Some(SectionTarget::Slot(slot));
        }

        [GemColor::Meta, GemColor::Red, GemColor::Yellow, GemColor::Blue]
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(value.trim()))
            .map(SectionTarget::Gem)
    }
}

impl fmt::Display for SectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SectionTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SectionTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SectionTarget::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown slot or bucket: {raw}")))
    }
}

/// Numeric equipment slot ids used by the in-game scoring tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlotId {
    Head = 1,
    Neck = 2,
    Shoulder = 3,
    Chest = 5,
    Waist = 6,
    Legs = 7,
    Feet = 8,
    Wrist = 9,
    Hands = 10,
    Finger1 = 11,
    Finger2 = 12,
    Trinket1 = 13,
    Trinket2 = 14,
    Back = 15,
    MainHand = 16,
    OffHand = 17,
    Ranged = 18,
}

impl SlotId {
    /// Scored slots in display order.
    pub const ALL: [SlotId; 17] = [
        SlotId::Head,
        SlotId::Neck,
        SlotId::Shoulder,
        SlotId::Chest,
        SlotId::Waist,
        SlotId::Legs,
        SlotId::Feet,
        SlotId::Wrist,
        SlotId::Hands,
        SlotId::Finger1,
        SlotId::Finger2,
        SlotId::Trinket1,
        SlotId::Trinket2,
        SlotId::Back,
        SlotId::MainHand,
        SlotId::OffHand,
        SlotId::Ranged,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            SlotId::Head => "Head",
            SlotId::Neck => "Neck",
            SlotId::Shoulder => "Shoulder",
            SlotId::Chest => "Chest",
            SlotId::Waist => "Waist",
            SlotId::Legs => "Legs",
            SlotId::Feet => "Feet",
            SlotId::Wrist => "Wrist",
            SlotId::Hands => "Hands",
            SlotId::Finger1 => "Finger 1",
            SlotId::Finger2 => "Finger 2",
            SlotId::Trinket1 => "Trinket 1",
            SlotId::Trinket2 => "Trinket 2",
            SlotId::Back => "Back",
            SlotId::MainHand => "Main Hand",
            SlotId::OffHand => "Off Hand",
            SlotId::Ranged => "Ranged/Relic",
        }
    }

    /// Armory equipment `slot_type` tokens.
    pub fn from_slot_type(token: &str) -> Option<SlotId> {
        let slot = match token.trim().to_ascii_uppercase().as_str() {
            "HEAD" => SlotId::Head,
            "NECK" => SlotId::Neck,
            "SHOULDER" => SlotId::Shoulder,
            "CHEST" => SlotId::Chest,
            "WAIST" => SlotId::Waist,
            "LEGS" => SlotId::Legs,
            "FEET" => SlotId::Feet,
            "WRIST" => SlotId::Wrist,
            "HANDS" => SlotId::Hands,
            "FINGER_1" => SlotId::Finger1,
            "FINGER_2" => SlotId::Finger2,
            "TRINKET_1" => SlotId::Trinket1,
            "TRINKET_2" => SlotId::Trinket2,
            "BACK" => SlotId::Back,
            "MAIN_HAND" => SlotId::MainHand,
            "OFF_HAND" => SlotId::OffHand,
            "RANGED" => SlotId::Ranged,
            _ => return None,
        };
        Some(slot)
    }
}
