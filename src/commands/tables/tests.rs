use crate::guide::coverage::DataTypesDetected;
use crate::guide::extract::{ItemRef, RankedPosition, SlotRanking};
use crate::guide::markup::RefKind;
use crate::guide::slot::{SectionTarget, Slot};
use crate::guide::title::{GuideType, Phase};
use crate::model::{CoverageSummary, GuideRecord};

use super::*;

fn ranking(slot: Slot, item_ids: &[u32]) -> SlotRanking {
    SlotRanking {
        target: SectionTarget::Slot(slot),
        positions: item_ids
            .iter()
            .enumerate()
            .map(|(index, item_id)| RankedPosition {
                order: index as u32 + 1,
                rank_label: "Best".to_string(),
                source_label: String::new(),
                alternatives: vec![ItemRef {
                    kind: RefKind::Item,
                    id: *item_id,
                    name: None,
                }],
            })
            .collect(),
    }
}

fn bis_record(spec: &str, phase: Phase, slots: Vec<SlotRanking>) -> GuideRecord {
    GuideRecord {
        spec: spec.to_string(),
        phase,
        guide_type: GuideType::Bis,
        applies_to_specs: vec![spec.to_string()],
        file: format!("{spec} {phase}.html"),
        sha256: String::new(),
        parse_error: None,
        slot_count: slots.len(),
        item_count: 0,
        slots,
        missing_expected_slots: Vec::new(),
        unparsed_slot_like_headers: Vec::new(),
        data_types_detected: DataTypesDetected::default(),
        diagnostics: Vec::new(),
    }
}

fn batch(guides: Vec<GuideRecord>) -> BatchManifest {
    BatchManifest {
        manifest_version: 1,
        run_id: "run-test".to_string(),
        generated_at: "2026-01-01T00:00:00Z".to_string(),
        guides,
        merged_specs: Vec::new(),
        coverage: CoverageSummary {
            spec_count: 0,
            guide_count: 0,
            phase_coverage: Vec::new(),
        },
    }
}

#[test]
fn map_weights_keeps_known_nonzero_tokens_at_their_maximum() {
    let raw = BTreeMap::from([
        ("Strength".to_string(), 2.2),
        ("SpellDamage".to_string(), 0.4),
        ("FireSpellDamage".to_string(), 0.9),
        ("Agility".to_string(), 0.0),
        ("Charisma".to_string(), 5.0),
    ]);

    let mapped = map_weights(&raw);

    assert_eq!(mapped.len(), 2);
    assert_eq!(mapped["ITEM_MOD_STRENGTH_SHORT"], 2.2);
    assert_eq!(mapped["ITEM_MOD_SPELL_POWER_SHORT"], 0.9);
}

#[test]
fn build_tables_projects_slots_and_falls_back_to_pre_raid() {
    let guides = vec![
        bis_record(
            "Feral Druid Tank",
            Phase::PreRaid,
            vec![ranking(Slot::Rings, &[1, 2]), ranking(Slot::Idols, &[3])],
        ),
        bis_record("Feral Druid Tank", Phase::P2, vec![ranking(Slot::Rings, &[4])]),
    ];
    let weights = RawWeights::from([(
        "druid_feral_tank".to_string(),
        BTreeMap::from([("Stamina".to_string(), 1.5)]),
    )]);

    let tables = build_tables(&batch(guides), &weights);

    let bear = &tables.classes["DRUID"]["Feral (Bear)"];
    assert_eq!(bear.spec_key, "druid_feral_tank");
    assert_eq!(bear.phases[&1].slots[&11], vec![1, 2]);
    assert_eq!(bear.phases[&1].slots[&12], vec![1, 2]);
    assert_eq!(bear.phases[&1].slots[&18], vec![3]);
    assert_eq!(bear.phases[&2].slots[&11], vec![4, 1, 2]);
    assert_eq!(bear.phases[&5].slots[&18], vec![3]);
    assert_eq!(bear.phases[&2].weights["ITEM_MOD_STAMINA_SHORT"], 1.5);
}

#[test]
fn build_tables_skips_specs_without_class() {
    let guides = vec![bis_record("Mystery Guide", Phase::P1, vec![ranking(Slot::Head, &[1])])];

    let tables = build_tables(&batch(guides), &RawWeights::new());

    assert!(tables.classes.is_empty());
}

#[test]
fn render_class_lua_writes_addon_data_layout() {
    let mut phases = BTreeMap::new();
    phases.insert(
        1,
        PhaseTable {
            slots: BTreeMap::from([(16, vec![100, 200]), (1, vec![300])]),
            weights: BTreeMap::from([("ITEM_MOD_STRENGTH_SHORT".to_string(), 2.0)]),
        },
    );
    let profiles = BTreeMap::from([(
        "Fury".to_string(),
        ProfileTables {
            spec: "Fury Warrior DPS".to_string(),
            spec_key: "warrior_fury".to_string(),
            phases,
        },
    )]);

    let lua = render_class_lua(ClassToken::Warrior, &profiles);
    let lines = lua.lines().collect::<Vec<&str>>();

    assert_eq!(lines[0], "BiScoreData = BiScoreData or {}");
    assert_eq!(lines[1], "BiScoreData[\"WARRIOR\"] = BiScoreData[\"WARRIOR\"] or {");
    assert_eq!(lines[2], "    [\"Fury\"] = {");
    assert_eq!(lines[3], "        [1] = {");
    assert_eq!(lines[5], "                [1] = { ranked = { [1] = 300 } },");
    assert_eq!(lines[6], "                [16] = { ranked = { [1] = 100, [2] = 200 } },");
    assert_eq!(lines[9], "                [\"ITEM_MOD_STRENGTH_SHORT\"] = 2.0000,");
    assert_eq!(lines[11], "            scoring = { floor = 0.35, cap = 1.00 },");
    assert!(lua.contains("        [5] = {\n            slots = {\n            },"));
    assert!(lua.ends_with("    },\n}\n"));
}

#[test]
fn render_class_lua_escapes_profile_names() {
    let profiles = BTreeMap::from([(
        "Odd \"Name\"".to_string(),
        ProfileTables::default(),
    )]);

    let lua = render_class_lua(ClassToken::Mage, &profiles);

    assert!(lua.contains("    [\"Odd \\\"Name\\\"\"] = {"));
}
