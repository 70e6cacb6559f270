use std::collections::{BTreeMap, BTreeSet};

use super::classify::{classify_heading, matching_rule, normalize_heading};
use super::coverage::{
    AuditThresholds, CoverageRules, FindingKind, Severity, audit_phase_maps, expected_slots,
    missing_expected_slots,
};
use super::extract::{RankedItemEntry, SlotRanking};
use super::merge::{
    SlotIdMap, SlotItemMap, build_numeric_phases, merge_phase_chain, merge_slot_ids,
    merge_slot_items, project_numeric,
};
use super::slot::{GemColor, Slot, SlotId};
use super::title::{ClassToken, Phase, TitleParser, expand_spec_targets, spec_profile};
use super::*;

fn parser() -> GuideParser {
    GuideParser::new().expect("guide parser")
}

fn page(markup: &str, lookup_json: Option<&str>) -> String {
    let literal = serde_json::to_string(markup).expect("encode markup");
    let mut page = format!(
        "<html><script>WH.markup.printHtml({literal}, \"guide-body\", {{ allow: 30 }});</script>"
    );
    if let Some(lookup_json) = lookup_json {
        page.push_str(&format!(
            "<script>WH.Gatherer.addData(3, 5, {lookup_json});</script>"
        ));
    }
    page.push_str("</html>");
    page
}

fn slot(slot: Slot) -> SectionTarget {
    SectionTarget::Slot(slot)
}

fn item_entry(id: u32) -> RankedItemEntry {
    RankedItemEntry {
        order: 1,
        rank: "Best".to_string(),
        item_id: Some(id),
        spell_id: None,
        item_name: None,
        source: String::new(),
        tie_group_size: 1,
        tie_group_index: 1,
        tie_with_previous: false,
        ref_type: RefKind::Item,
        ref_id: id,
    }
}

fn item_map(entries: &[(Slot, &[u32])]) -> SlotItemMap {
    entries
        .iter()
        .map(|(target, ids)| (slot(*target), ids.iter().copied().map(item_entry).collect()))
        .collect()
}

fn ids(entries: &[RankedItemEntry]) -> Vec<u32> {
    entries.iter().map(|entry| entry.ref_id).collect()
}

#[test]
fn extract_markup_decodes_json_string_literal() {
    let markup = "[h3 toc=\"Head\"]Head[/h3]\nline\t\"quoted\" a/b \u{e9}";
    let decoded = parser()
        .extract_markup(&page(markup, None))
        .expect("markup");
    assert_eq!(decoded, markup);
}

#[test]
fn extract_markup_falls_back_to_lenient_unescape() {
    let page = r#"WH.markup.printHtml("[h3 toc=\"Head\"]Head[/h3] it\'s\nnext", "guide");"#;
    let decoded = parser().extract_markup(page).expect("markup");
    assert_eq!(decoded, "[h3 toc=\"Head\"]Head[/h3] it's\nnext");
}

#[test]
fn extract_markup_accepts_concatenated_payloads() {
    let long = "x".repeat(120);
    let page = format!(r#"WH.markup.printHtml("{long}" + "tail", "guide");"#);
    // The first literal is followed by `+`, so only the long-literal form matches.
    let decoded = parser().extract_markup(&page).expect("markup");
    assert_eq!(decoded, long);
}

#[test]
fn extract_markup_reports_missing_payload() {
    let result = parser().parse_page("<html><body>No guide here</body></html>", GuideType::Bis);
    assert_eq!(result, Err(GuideError::MarkupNotFound));
}

#[test]
fn item_lookup_reads_plain_and_object_values() {
    let locator = locator::PageLocator::new().expect("locator");
    let page = page(
        "",
        Some(r#"{"100":"Plain Name","200":{"name_enus":"Enus Name","quality":4},"300":{"name":"Fallback"},"bad":"x"}"#),
    );
    let lookup = locator.extract_item_lookup(&page).expect("lookup");
    assert_eq!(lookup.name_count(), 3);
    assert_eq!(lookup.name(100), Some("Plain Name"));
    assert_eq!(lookup.name(200), Some("Enus Name"));
    assert_eq!(lookup.name(300), Some("Fallback"));
}

#[test]
fn missing_item_lookup_is_a_diagnostic_not_an_error() {
    let markup = "[h3 toc=\"Neck\"]Neck[/h3][table][tr][td]1[/td][td][item=77][/td][/tr][/table]";
    let parsed = parser()
        .parse_page(&page(markup, None), GuideType::Bis)
        .expect("parsed");

    assert!(
        parsed
            .extracted
            .diagnostics
            .contains(&GuideDiagnostic::ItemLookupAbsent)
    );
    let neck = parsed.extracted.slot(slot(Slot::Neck)).expect("neck");
    assert_eq!(neck.positions[0].alternatives[0].id, 77);
    assert_eq!(neck.positions[0].alternatives[0].name, None);
}

#[test]
fn example_helm_scenario() {
    let markup = "[h3 toc=\"Head\"]Head[/h3][table][tr][td]Rank 1[/td][td][item=12345][/td][td]Source[/td][/tr][/table]";
    let parsed = parser()
        .parse_page(&page(markup, Some(r#"{"12345": "Example Helm"}"#)), GuideType::Bis)
        .expect("parsed");

    assert_eq!(parsed.extracted.slots.len(), 1);
    let head = &parsed.extracted.slots[0];
    assert_eq!(head.target, slot(Slot::Head));

    let entries = head.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].item_id, Some(12345));
    assert_eq!(entries[0].item_name.as_deref(), Some("Example Helm"));
    assert_eq!(entries[0].order, 1);
    assert_eq!(entries[0].tie_group_size, 1);
    assert_eq!(entries[0].rank, "Rank 1");
    assert_eq!(entries[0].source, "Source");
}

#[test]
fn tie_groups_share_order_and_flag_followers() {
    let markup = "[h3 toc=\"Trinkets\"]Trinkets[/h3][table]\
        [tr][td]Rank[/td][td]Item[/td][td]Source[/td][/tr]\
        [tr][td]1[/td][td][item=1] or [item=2] or [item=3 domain=tbc][/td][td][b]Karazhan[/b][/td][/tr]\
        [tr][td]2[/td][td][item=4][/td][/tr]\
        [/table]";
    let parsed = parser().parse_markup(markup, None, GuideType::Bis);
    let trinkets = parsed
        .extracted
        .slot(slot(Slot::Trinkets))
        .expect("trinkets");

    assert_eq!(trinkets.positions.len(), 2);
    let entries = trinkets.entries();
    let first_row = entries
        .iter()
        .filter(|entry| entry.order == 1)
        .collect::<Vec<_>>();
    assert_eq!(first_row.len(), 3);
    assert!(first_row.iter().all(|entry| entry.tie_group_size == 3));
    assert_eq!(
        first_row.iter().filter(|entry| entry.tie_with_previous).count(),
        2
    );
    assert_eq!(
        first_row
            .iter()
            .map(|entry| entry.tie_group_index)
            .collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(first_row[0].source, "Karazhan");
    assert_eq!(entries[3].order, 2);
    assert_eq!(entries[3].source, "");
}

#[test]
fn repeated_items_are_dropped_and_rows_without_new_items_do_not_advance_order() {
    let markup = "[h3 toc=\"Rings\"]Rings[/h3][table]\
        [tr][td]1[/td][td][item=10][/td][/tr]\
        [tr][td]2[/td][td][item=10][/td][/tr]\
        [tr][td]3[/td][td][item=10] [item=11][/td][/tr]\
        [/table]\
        [h4]Ring[/h4][table][tr][td]4[/td][td][item=11][item=12][/td][/tr][/table]";
    let parsed = parser().parse_markup(markup, None, GuideType::Bis);
    let rings = parsed.extracted.slot(slot(Slot::Rings)).expect("rings");

    let orders = rings
        .positions
        .iter()
        .map(|position| position.order)
        .collect::<Vec<_>>();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(ids(&rings.entries()), vec![10, 11, 12]);
    assert!(rings.entries().iter().all(|entry| entry.tie_group_size == 1));
}

#[test]
fn tie_group_counts_only_references_new_to_the_slot() {
    let markup = "[h3 toc=\"Trinkets\"]Trinkets[/h3][table]\
        [tr][td]1[/td][td][item=5] or [item=5] or [item=6][/td][/tr]\
        [/table]";
    let parsed = parser().parse_markup(markup, None, GuideType::Bis);
    let trinkets = parsed
        .extracted
        .slot(slot(Slot::Trinkets))
        .expect("trinkets");

    let entries = trinkets.entries();
    assert_eq!(ids(&entries), vec![5, 6]);
    assert!(entries.iter().all(|entry| entry.tie_group_size == 2));
    assert_eq!(
        entries
            .iter()
            .map(|entry| entry.tie_group_index)
            .collect::<Vec<_>>(),
        vec![1, 2]
    );
}

#[test]
fn rows_repeating_earlier_items_keep_the_section_out_of_inline_fallback() {
    let markup = "[h3 toc=\"Head\"]Head[/h3][table][tr][td]1[/td][td][item=1][/td][/tr][/table]\
        [h4]Head[/h4]Also consider [item=999].\
        [table][tr][td]1[/td][td][item=1][/td][/tr][/table]";
    let parsed = parser().parse_markup(markup, None, GuideType::Bis);
    let head = parsed.extracted.slot(slot(Slot::Head)).expect("head");

    assert_eq!(ids(&head.entries()), vec![1]);
    assert!(!parsed
        .extracted
        .diagnostics
        .iter()
        .any(|diagnostic| matches!(diagnostic, GuideDiagnostic::EmptySlotResult { .. })));
}

#[test]
fn inline_fallback_after_ranked_rows_adds_alternatives_only() {
    let markup = "[h3 toc=\"Head\"]Head[/h3][table][tr][td]1[/td][td][item=1][/td][/tr][/table]\
        [h4]Head[/h4]Other options: [item=2] and [item=1].";
    let parsed = parser().parse_markup(markup, None, GuideType::Bis);
    let head = parsed.extracted.slot(slot(Slot::Head)).expect("head");

    let entries = head.entries();
    assert_eq!(ids(&entries), vec![1, 2]);
    assert_eq!(entries[0].rank, "1");
    assert_eq!(entries[1].rank, "Alternative");
    assert_eq!(entries[1].order, 2);
}

#[test]
fn sections_without_rows_fall_back_to_inline_references() {
    let markup = "[h3 toc=\"Best Red Gems\"]Best Red Gems[/h3]\
        Use [item=24027] or [item=24028]. Cheaper: [spell=31080] then [item=24027].";
    let parsed = parser().parse_markup(markup, None, GuideType::GemsEnchants);
    let red = parsed
        .extracted
        .slot(SectionTarget::Gem(GemColor::Red))
        .expect("red bucket");

    let entries = red.entries();
    assert_eq!(ids(&entries), vec![24027, 24028, 31080]);
    assert_eq!(
        entries.iter().map(|entry| entry.order).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(entries[0].rank, "Best");
    assert_eq!(entries[1].rank, "Alternative");
    assert_eq!(entries[2].spell_id, Some(31080));
    assert_eq!(entries[2].item_id, None);
}

#[test]
fn empty_and_unclassified_sections_become_diagnostics() {
    let markup = "[h3 toc=\"Body Armor\"]Body Armor[/h3][h4]Neck[/h4]Nothing yet.\
        [h4]Head[/h4][table][tr][td]1[/td][td][item=5][/td][/tr][/table]";
    let parsed = parser().parse_markup(markup, None, GuideType::Bis);

    assert_eq!(parsed.extracted.slots.len(), 1);
    assert!(parsed.extracted.slot(slot(Slot::Neck)).is_none());
    assert!(parsed.extracted.diagnostics.contains(&GuideDiagnostic::EmptySlotResult {
        heading: "Neck".to_string(),
        target: "Neck".to_string(),
    }));
    assert_eq!(parsed.extracted.unclassified_headings(), vec!["Body Armor"]);
    assert_eq!(parsed.toc_headings, vec!["Body Armor".to_string()]);
}

#[test]
fn well_formed_row_under_any_recognised_heading_yields_items() {
    let headings = ["Head", "Wrists", "Gloves", "Off Hand", "Librams", "Main Hand for Fury"];
    let grammar_parser = parser();
    for heading in headings {
        let markup = format!(
            "[h3 toc=\"{heading}\"]{heading}[/h3][table][tr][td]Best[/td][td][item=9][/td][/tr][/table]"
        );
        let parsed = grammar_parser.parse_markup(&markup, None, GuideType::Bis);
        assert!(parsed.extracted.item_count() >= 1, "{heading}");
    }
}

#[test]
fn dual_wield_heading_feeds_both_hands() {
    assert_eq!(
        classify_heading("One-Handed Weapons (Dual-Wield)", "", GuideType::Bis),
        vec![slot(Slot::MainHand), slot(Slot::OffHand)]
    );
    assert_eq!(
        matching_rule("One-Handed Weapons (Dual-Wield)", ""),
        Some("dual_weapon")
    );
}

#[test]
fn gloves_classify_to_hands_not_main_hand() {
    assert_eq!(
        classify_heading("Gloves", "", GuideType::Bis),
        vec![slot(Slot::Hands)]
    );
    // Glove headings ignore weapon words in the body.
    assert_eq!(
        classify_heading("Gloves", "pairs well with your main hand", GuideType::Bis),
        vec![slot(Slot::Hands)]
    );
}

#[test]
fn bare_hand_heading_consults_body_for_weapon_cues() {
    assert_eq!(
        classify_heading("Best Hand Slot", "", GuideType::Bis),
        vec![slot(Slot::Hands)]
    );
    assert_eq!(
        classify_heading("Best Hand Slot", "Pick a main-hand first", GuideType::Bis),
        vec![slot(Slot::MainHand)]
    );
    assert_eq!(
        classify_heading("Best Hand Slot", "main hand and off-hand options", GuideType::Bis),
        vec![slot(Slot::MainHand), slot(Slot::OffHand)]
    );
}

#[test]
fn weapon_and_relic_rules() {
    let cases = [
        ("Shields", vec![slot(Slot::OffHand)]),
        ("Two-Handed Weapons", vec![slot(Slot::MainHand)]),
        ("Main Hand and Off Hand Weapons", vec![slot(Slot::MainHand), slot(Slot::OffHand)]),
        ("Best Idol", vec![slot(Slot::Idols)]),
        ("Relic", vec![slot(Slot::Ranged)]),
        ("Wands", vec![slot(Slot::Ranged)]),
        ("Ranged Weapons", vec![slot(Slot::Ranged)]),
        ("Stat Priority", vec![]),
    ];
    for (heading, expected) in cases {
        assert_eq!(classify_heading(heading, "", GuideType::Bis), expected, "{heading}");
    }
    assert_eq!(matching_rule("Relic", ""), Some("ranged_class"));
    assert_eq!(matching_rule("Stat Priority", ""), None);
}

#[test]
fn aliases_apply_after_qualifier_is_stripped() {
    assert_eq!(normalize_heading("Rings  for   Fury Warriors"), "Rings");
    assert_eq!(normalize_heading("For Honor"), "For Honor");
    assert_eq!(normalize_heading("  Off   Hand "), "Off Hand");
    assert_eq!(
        classify_heading("Wrists for Holy Paladins", "", GuideType::Bis),
        vec![slot(Slot::Wrist)]
    );
    assert_eq!(
        classify_heading("FINGER", "", GuideType::Bis),
        vec![slot(Slot::Rings)]
    );
    assert_eq!(matching_rule("Idols for Feral", ""), Some("alias"));
}

#[test]
fn gem_guides_use_bucket_taxonomy_only() {
    let cases = [
        ("Best Red Gems", vec![SectionTarget::Gem(GemColor::Red)]),
        ("Meta Gem", vec![SectionTarget::Gem(GemColor::Meta)]),
        ("Meta", vec![SectionTarget::Gem(GemColor::Meta)]),
        ("Chest Enchant", vec![slot(Slot::Chest)]),
        ("Off Hand Enchant", vec![slot(Slot::OffHand)]),
        ("Shoulders", vec![slot(Slot::Shoulders)]),
        ("Gloves", vec![]),
    ];
    for (heading, expected) in cases {
        assert_eq!(
            classify_heading(heading, "", GuideType::GemsEnchants),
            expected,
            "{heading}"
        );
    }
}

#[test]
fn classification_is_a_pure_function_of_its_input() {
    let headings = [
        "Head",
        "One-Handed Weapons (Dual-Wield)",
        "Gloves",
        "Best Hand Slot",
        "Totems for Enhancement Shamans",
        "Something Else",
    ];
    for heading in headings {
        let first = classify_heading(heading, "main hand", GuideType::Bis);
        let second = classify_heading(heading, "main hand", GuideType::Bis);
        assert_eq!(first, second, "{heading}");
        assert_eq!(
            classify_heading(&normalize_heading(heading), "main hand", GuideType::Bis),
            first,
            "{heading}"
        );
    }
}

#[test]
fn slot_ranking_serializes_as_flat_items_and_regroups() {
    let markup = "[h3 toc=\"Back\"]Back[/h3][table][tr][td]1[/td][td][item=1][item=2][/td][td]Kara[/td][/tr][tr][td]2[/td][td][item=3][/td][/tr][/table]";
    let parsed = parser().parse_markup(markup, None, GuideType::Bis);
    let back = parsed.extracted.slots[0].clone();

    let value = serde_json::to_value(&back).expect("serialize");
    assert_eq!(value["slot"], "Back");
    assert_eq!(value["items"].as_array().map(Vec::len), Some(3));
    assert_eq!(value["items"][1]["tie_with_previous"], true);
    assert_eq!(value["items"][1]["ref_type"], "item");

    let restored: SlotRanking = serde_json::from_value(value).expect("deserialize");
    assert_eq!(restored, back);
}

#[test]
fn slot_ranking_rejects_decreasing_orders() {
    let mut late = item_entry(1);
    late.order = 2;
    let early = item_entry(2);
    let value = serde_json::json!({ "slot": "Head", "items": [late, early] });
    assert!(serde_json::from_value::<SlotRanking>(value).is_err());
}

#[test]
fn merge_keeps_current_order_without_duplicates() {
    let prior: SlotIdMap = [(SlotId::Head, vec![10])].into_iter().collect();
    let current: SlotIdMap = [(SlotId::Head, vec![20, 10])].into_iter().collect();
    let merged = merge_slot_ids(&prior, &current);
    assert_eq!(merged.get(&SlotId::Head), Some(&vec![20, 10]));
    assert_eq!(merged.len(), 1);
}

#[test]
fn merge_is_a_deduplicated_union_per_slot() {
    let prior = item_map(&[(Slot::Head, &[1, 2, 3]), (Slot::Neck, &[4]), (Slot::Feet, &[])]);
    let current = item_map(&[(Slot::Head, &[3, 5, 5]), (Slot::Back, &[6])]);
    let merged = merge_slot_items(&prior, &current);

    assert_eq!(ids(&merged[&slot(Slot::Head)]), vec![3, 5, 1, 2]);
    assert_eq!(ids(&merged[&slot(Slot::Neck)]), vec![4]);
    assert_eq!(ids(&merged[&slot(Slot::Back)]), vec![6]);
    assert!(!merged.contains_key(&slot(Slot::Feet)));

    for (target, entries) in &merged {
        let unique = entries
            .iter()
            .map(RankedItemEntry::identity)
            .collect::<BTreeSet<_>>();
        assert_eq!(unique.len(), entries.len(), "{target}");
    }
}

#[test]
fn phase_chain_orders_by_most_recent_phase() {
    let phases: BTreeMap<Phase, SlotItemMap> = [
        (Phase::PreRaid, item_map(&[(Slot::Head, &[1])])),
        (Phase::P1, item_map(&[(Slot::Head, &[2])])),
        (Phase::P3, item_map(&[(Slot::Head, &[3, 1])])),
    ]
    .into_iter()
    .collect();
    let merged = merge_phase_chain(&phases);

    assert_eq!(ids(&merged[&Phase::P1][&slot(Slot::Head)]), vec![2, 1]);
    assert!(!merged.contains_key(&Phase::P2));
    assert_eq!(ids(&merged[&Phase::P3][&slot(Slot::Head)]), vec![3, 1, 2]);
}

#[test]
fn dual_slots_project_onto_two_numeric_ids() {
    let mut map = item_map(&[
        (Slot::Rings, &[1, 2]),
        (Slot::Trinkets, &[3]),
        (Slot::Weapons, &[4]),
        (Slot::MainHand, &[5, 4]),
        (Slot::Idols, &[6]),
    ]);
    let mut spell = item_entry(99);
    spell.item_id = None;
    spell.spell_id = Some(99);
    spell.ref_type = RefKind::Spell;
    map.insert(slot(Slot::Neck), vec![spell]);

    assert_eq!(Slot::Rings.slot_ids(), &[SlotId::Finger1, SlotId::Finger2]);
    assert_eq!(Slot::Trinkets.slot_ids(), &[SlotId::Trinket1, SlotId::Trinket2]);

    let numeric = project_numeric(&map);
    assert_eq!(numeric[&SlotId::Finger1], vec![1, 2]);
    assert_eq!(numeric[&SlotId::Finger2], vec![1, 2]);
    assert_eq!(numeric[&SlotId::Trinket1], vec![3]);
    assert_eq!(numeric[&SlotId::Trinket2], vec![3]);
    assert_eq!(numeric[&SlotId::MainHand], vec![5, 4]);
    assert_eq!(numeric[&SlotId::Ranged], vec![6]);
    assert!(!numeric.contains_key(&SlotId::Neck));
}

#[test]
fn numeric_phases_fall_back_to_pre_raid_and_carry_forward() {
    let phases: BTreeMap<Phase, SlotItemMap> = [
        (Phase::PreRaid, item_map(&[(Slot::Head, &[1])])),
        (Phase::P2, item_map(&[(Slot::Head, &[2])])),
    ]
    .into_iter()
    .collect();
    let tables = build_numeric_phases(&phases);

    assert_eq!(tables[&1][&SlotId::Head], vec![1]);
    assert_eq!(tables[&2][&SlotId::Head], vec![2, 1]);
    assert_eq!(tables[&5][&SlotId::Head], vec![2, 1]);
}

#[test]
fn guide_titles_map_to_spec_phase_and_type() {
    let titles = TitleParser::new().expect("title parser");
    let cases = [
        (
            "Burning Crusade Classic Fury Warrior DPS Best in Slot (BiS) Phase 3 - Wowhead.html",
            "Fury Warrior DPS",
            Phase::P3,
            GuideType::Bis,
        ),
        (
            "Retribution Paladin DPS Phase 2 Best in Slot (BiS) - Wowhead.html",
            "Retribution Paladin DPS",
            Phase::P2,
            GuideType::Bis,
        ),
        (
            "Feral Druid Tank Pre-Raid Best in Slot (BiS) - Wowhead.html",
            "Feral Druid Tank",
            Phase::PreRaid,
            GuideType::Bis,
        ),
        (
            "Holy Paladin Healer Karazhan Best in Slot - Wowhead.html",
            "Holy Paladin Healing",
            Phase::P1,
            GuideType::Bis,
        ),
        (
            "Elemental Shaman DPS BT and Hyjal Best in Slot - Wowhead.html",
            "Elemental Shaman DPS",
            Phase::P3,
            GuideType::Bis,
        ),
        (
            "Arms Warrior DPS Sunwell Best in Slot - Wowhead.html",
            "Arms Warrior DPS",
            Phase::P5,
            GuideType::Bis,
        ),
        (
            "TBC Warlock DPS Gems & Enchants Guide - Wowhead.html",
            "Warlock DPS",
            Phase::All,
            GuideType::GemsEnchants,
        ),
    ];
    for (name, spec, phase, guide_type) in cases {
        let title = titles.parse(name).expect(name);
        assert_eq!(title.spec, spec, "{name}");
        assert_eq!(title.phase, phase, "{name}");
        assert_eq!(title.guide_type, guide_type, "{name}");
    }
    assert_eq!(titles.parse("Patch Notes - Wowhead.html"), None);
}

#[test]
fn class_gem_guides_expand_to_every_spec() {
    assert_eq!(
        expand_spec_targets("Warrior DPS", GuideType::GemsEnchants),
        vec!["Arms Warrior DPS", "Fury Warrior DPS"]
    );
    assert_eq!(
        expand_spec_targets("Warrior DPS", GuideType::Bis),
        vec!["Warrior DPS"]
    );
}

#[test]
fn spec_names_derive_class_and_profile() {
    let hunter = spec_profile("Beast Mastery Hunter DPS").expect("hunter");
    assert_eq!(hunter.class, ClassToken::Hunter);
    assert_eq!(hunter.profile, "Beast Mastery");
    assert_eq!(hunter.spec_key, "hunter_beast_mastery");

    let bear = spec_profile("Feral Druid Tank").expect("bear");
    assert_eq!(bear.profile, "Feral (Bear)");
    assert_eq!(bear.spec_key, "druid_feral_tank");

    let cat = spec_profile("Feral Druid DPS").expect("cat");
    assert_eq!(cat.profile, "Feral (Cat)");

    assert_eq!(spec_profile("Warlock DPS"), None);
    assert_eq!(ClassToken::Shaman.relic_slot(), Slot::Totems);
}

#[test]
fn expected_slots_follow_the_class_relic() {
    let druid = expected_slots(Some(ClassToken::Druid));
    assert_eq!(druid.len(), 14);
    assert!(druid.contains(&Slot::Idols));
    assert!(!druid.contains(&Slot::Ranged));

    let mut parsed = Slot::ALL
        .iter()
        .map(|slot| SectionTarget::Slot(*slot))
        .collect::<BTreeSet<_>>();
    parsed.remove(&slot(Slot::MainHand));
    parsed.remove(&slot(Slot::Idols));
    assert_eq!(
        missing_expected_slots(&parsed, Some(ClassToken::Druid)),
        vec![Slot::Idols]
    );
}

#[test]
fn coverage_flags_gear_headings_that_were_not_parsed() {
    let rules = CoverageRules::new().expect("rules");
    let headings = vec![
        "Head".to_string(),
        "Best Shoulders".to_string(),
        "Stat Priority".to_string(),
        "Best Shoulders".to_string(),
    ];
    let parsed = [slot(Slot::Head)].into_iter().collect::<BTreeSet<_>>();
    assert_eq!(
        rules.detect_slot_like_unparsed(&headings, &parsed, GuideType::Bis),
        vec!["Best Shoulders".to_string()]
    );

    let detected = rules.detect_data_types(&headings, GuideType::Bis);
    assert!(detected.stat_weights);
    assert!(!detected.gems);
    let detected = rules.detect_data_types(&[], GuideType::GemsEnchants);
    assert!(detected.gems && detected.enchants);
}

#[test]
fn audit_reports_missing_and_thin_phases() {
    let phases: BTreeMap<Phase, SlotItemMap> =
        [(Phase::P1, item_map(&[(Slot::Head, &[1])]))].into_iter().collect();
    let findings = audit_phase_maps(&phases, &AuditThresholds::default());

    let kinds = findings
        .iter()
        .map(|finding| (finding.kind, finding.phase))
        .collect::<Vec<_>>();
    assert!(kinds.contains(&(FindingKind::LowSlotCoverage, 1)));
    assert!(kinds.contains(&(FindingKind::ManySingletonSlots, 1)));
    for phase in 2..=5 {
        assert!(kinds.contains(&(FindingKind::MissingPhaseGuide, phase)));
    }
    assert!(
        findings
            .iter()
            .filter(|finding| finding.kind == FindingKind::MissingPhaseGuide)
            .all(|finding| finding.severity == Severity::High)
    );
}

#[test]
fn audit_flags_empty_parse_and_missing_core_slots() {
    let phases: BTreeMap<Phase, SlotItemMap> = [
        (Phase::P1, SlotItemMap::new()),
        (Phase::P2, SlotItemMap::new()),
        (Phase::P3, SlotItemMap::new()),
        (Phase::P4, SlotItemMap::new()),
        (Phase::P5, item_map(&[(Slot::Head, &[1, 2])])),
    ]
    .into_iter()
    .collect();
    let findings = audit_phase_maps(&phases, &AuditThresholds::default());

    assert!(
        findings
            .iter()
            .any(|finding| finding.kind == FindingKind::EmptyPhaseParse && finding.phase == 1)
    );
    let core = findings
        .iter()
        .find(|finding| finding.kind == FindingKind::MissingCoreSlotsP5)
        .expect("core slot finding");
    assert_eq!(core.detail, "Missing core slots in P5: [3, 5, 7, 10, 16]");
}

#[test]
fn unique_refs_group_by_kind() {
    let refs = parser().unique_refs("[item=3][spell=9][item=1][item=3][enchant=2684]");
    assert_eq!(refs[&RefKind::Item], vec![1, 3]);
    assert_eq!(refs[&RefKind::Spell], vec![9]);
    assert_eq!(refs[&RefKind::Enchant], vec![2684]);
}
