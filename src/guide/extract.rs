use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::classify::classify_heading;
use super::error::{GuideDiagnostic, RankingError};
use super::locator::ItemLookup;
use super::markup::{MarkupGrammar, RefKind};
use super::slot::SectionTarget;
use super::title::GuideType;

pub type RefIdentity = (RefKind, u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: RefKind,
    pub id: u32,
    pub name: Option<String>,
}

impl ItemRef {
    pub fn identity(&self) -> RefIdentity {
        (self.kind, self.id)
    }
}

/// One ranked row. Every alternative shares the row's order and labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPosition {
    pub order: u32,
    pub rank_label: String,
    pub source_label: String,
    pub alternatives: Vec<ItemRef>,
}

impl RankedPosition {
    /// Flat entries with tie metadata derived from the alternatives.
    pub fn entries(&self) -> Vec<RankedItemEntry> {
        let size = self.alternatives.len();
        self.alternatives
            .iter()
            .enumerate()
            .map(|(index, item)| RankedItemEntry {
                order: self.order,
                rank: self.rank_label.clone(),
                item_id: (item.kind == RefKind::Item).then_some(item.id),
                spell_id: (item.kind != RefKind::Item).then_some(item.id),
                item_name: item.name.clone(),
                source: self.source_label.clone(),
                tie_group_size: size,
                tie_group_index: index + 1,
                tie_with_previous: index > 0,
                ref_type: item.kind,
                ref_id: item.id,
            })
            .collect()
    }
}

/// Output form of a ranked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedItemEntry {
    pub order: u32,
    pub rank: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_id: Option<u32>,
    #[serde(default)]
    pub item_name: Option<String>,
    pub source: String,
    pub tie_group_size: usize,
    pub tie_group_index: usize,
    pub tie_with_previous: bool,
    pub ref_type: RefKind,
    pub ref_id: u32,
}

impl RankedItemEntry {
    pub fn identity(&self) -> RefIdentity {
        (self.ref_type, self.ref_id)
    }
}

/// Ranked positions for one slot or gem bucket of one guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SlotItems", try_from = "SlotItems")]
pub struct SlotRanking {
    pub target: SectionTarget,
    pub positions: Vec<RankedPosition>,
}

impl SlotRanking {
    fn empty(target: SectionTarget) -> Self {
        Self {
            target,
            positions: Vec::new(),
        }
    }

    pub fn entries(&self) -> Vec<RankedItemEntry> {
        self.positions
            .iter()
            .flat_map(RankedPosition::entries)
            .collect()
    }

    pub fn item_count(&self) -> usize {
        self.positions
            .iter()
            .map(|position| position.alternatives.len())
            .sum()
    }

    fn seen(&self) -> HashSet<RefIdentity> {
        self.positions
            .iter()
            .flat_map(|position| position.alternatives.iter().map(ItemRef::identity))
            .collect()
    }

    fn next_order(&self) -> u32 {
        self.positions
            .last()
            .map(|position| position.order + 1)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotItems {
    slot: SectionTarget,
    items: Vec<RankedItemEntry>,
}

impl From<SlotRanking> for SlotItems {
    fn from(ranking: SlotRanking) -> Self {
        Self {
            items: ranking.entries(),
            slot: ranking.target,
        }
    }
}

impl TryFrom<SlotItems> for SlotRanking {
    type Error = RankingError;

    fn try_from(value: SlotItems) -> Result<Self, Self::Error> {
        let mut positions: Vec<RankedPosition> = Vec::new();

        for entry in value.items {
            let item = ItemRef {
                kind: entry.ref_type,
                id: entry.ref_id,
                name: entry.item_name,
            };
            match positions.last_mut() {
                Some(last) if last.order == entry.order => last.alternatives.push(item),
                Some(last) if last.order > entry.order => {
                    return Err(RankingError::OrderNotIncreasing {
                        slot: value.slot.to_string(),
                        order: entry.order,
                        previous: last.order,
                    });
                }
                _ => positions.push(RankedPosition {
                    order: entry.order,
                    rank_label: entry.rank,
                    source_label: entry.source,
                    alternatives: vec![item],
                }),
            }
        }

        Ok(Self {
            target: value.slot,
            positions,
        })
    }
}

/// Slot rankings of one guide in first-seen order, plus what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedGuide {
    pub slots: Vec<SlotRanking>,
    pub diagnostics: Vec<GuideDiagnostic>,
}

impl ExtractedGuide {
    #[cfg(test)]
    pub fn slot(&self, target: SectionTarget) -> Option<&SlotRanking> {
        self.slots.iter().find(|ranking| ranking.target == target)
    }

    pub fn item_count(&self) -> usize {
        self.slots.iter().map(SlotRanking::item_count).sum()
    }

    #[cfg(test)]
    pub fn unclassified_headings(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter_map(|diagnostic| match diagnostic {
                GuideDiagnostic::UnclassifiedHeading { heading } => Some(heading.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Walks the sections of decoded markup and collects ranked rows per target.
pub fn extract_by_slot(
    grammar: &MarkupGrammar,
    markup: &str,
    lookup: &ItemLookup,
    guide_type: GuideType,
) -> ExtractedGuide {
    let mut guide = ExtractedGuide::default();

    for section in grammar.sections(markup) {
        let targets = classify_heading(&section.heading, section.body, guide_type);
        if targets.is_empty() {
            guide.diagnostics.push(GuideDiagnostic::UnclassifiedHeading {
                heading: section.heading.clone(),
            });
            continue;
        }

        for target in targets {
            let index = match guide.slots.iter().position(|ranking| ranking.target == target) {
                Some(index) => index,
                None => {
                    guide.slots.push(SlotRanking::empty(target));
                    guide.slots.len() - 1
                }
            };
            let ranking = &mut guide.slots[index];

            if append_table_rows(grammar, ranking, section.body, lookup) > 0 {
                continue;
            }
            if append_inline_refs(grammar, ranking, section.body, lookup) == 0 {
                guide.diagnostics.push(GuideDiagnostic::EmptySlotResult {
                    heading: section.heading.clone(),
                    target: target.to_string(),
                });
            }
        }
    }

    guide.slots.retain(|ranking| !ranking.positions.is_empty());
    guide
}

fn resolve(kind: RefKind, id: u32, lookup: &ItemLookup) -> ItemRef {
    let name = match kind {
        RefKind::Item => lookup.name(id).map(str::to_string),
        RefKind::Spell | RefKind::Enchant => None,
    };
    ItemRef { kind, id, name }
}

/// Returns the number of well-formed ranked rows, counting rows whose items
/// all repeat earlier entries of the slot. A row's tie group holds only the
/// references new to the slot, so a cell repeating an item counts it once.
fn append_table_rows(
    grammar: &MarkupGrammar,
    ranking: &mut SlotRanking,
    body: &str,
    lookup: &ItemLookup,
) -> usize {
    let mut seen = ranking.seen();
    let mut valid_rows = 0;

    for table in grammar.tables(body) {
        for row in grammar.rows(table) {
            let cells = grammar.cells(row);
            if cells.len() < 2 {
                continue;
            }

            let rank_label = grammar.clean_text(cells[0]);
            if rank_label.is_empty() || rank_label.eq_ignore_ascii_case("rank") {
                continue;
            }

            let item_ids = grammar.references_of(cells[1], RefKind::Item);
            if item_ids.is_empty() {
                continue;
            }
            valid_rows += 1;

            let mut alternatives = Vec::new();
            for id in item_ids {
                if seen.insert((RefKind::Item, id)) {
                    alternatives.push(resolve(RefKind::Item, id, lookup));
                }
            }
            if alternatives.is_empty() {
                continue;
            }

            let source_label = cells
                .get(2)
                .map(|cell| grammar.clean_text(cell))
                .unwrap_or_default();
            ranking.positions.push(RankedPosition {
                order: ranking.next_order(),
                rank_label,
                source_label,
                alternatives,
            });
        }
    }

    valid_rows
}

/// Flat reference lists: the first mention is the pick, unless the slot
/// already holds items from an earlier section.
fn append_inline_refs(
    grammar: &MarkupGrammar,
    ranking: &mut SlotRanking,
    body: &str,
    lookup: &ItemLookup,
) -> usize {
    let mut seen = ranking.seen();
    let mut added = 0;
    let had_items = !ranking.positions.is_empty();

    for reference in grammar.references(body) {
        if reference.kind == RefKind::Enchant || !seen.insert((reference.kind, reference.id)) {
            continue;
        }

        let rank_label = if added == 0 && !had_items {
            "Best"
        } else {
            "Alternative"
        };
        ranking.positions.push(RankedPosition {
            order: ranking.next_order(),
            rank_label: rank_label.to_string(),
            source_label: String::new(),
            alternatives: vec![resolve(reference.kind, reference.id, lookup)],
        });
        added += 1;
    }

    added
}
