use super::*;

const DATA_TYPE_NAMES: [&str; 5] = ["bis_slots", "enchants", "gems", "overrides", "stat_weights"];

/// One row per discovered spec and progression phase.
pub(super) fn summarize_coverage(guides: &[GuideRecord]) -> CoverageSummary {
    let mut by_spec_phase: BTreeMap<(&str, Phase), Vec<&GuideRecord>> = BTreeMap::new();
    let mut spec_data_types: BTreeMap<&str, DataTypesDetected> = BTreeMap::new();
    let mut specs = BTreeSet::new();

    for guide in guides {
        specs.extend(guide.applies_to_specs.iter().map(String::as_str));
        if Phase::PROGRESSION.contains(&guide.phase) {
            by_spec_phase
                .entry((guide.spec.as_str(), guide.phase))
                .or_default()
                .push(guide);
            let detected = spec_data_types.entry(guide.spec.as_str()).or_default();
            *detected = detected.union(guide.data_types_detected);
        } else {
            for target in &guide.applies_to_specs {
                let detected = spec_data_types.entry(target.as_str()).or_default();
                *detected = detected.union(guide.data_types_detected);
            }
        }
    }

    let mut phase_coverage = Vec::with_capacity(specs.len() * Phase::PROGRESSION.len());
    for spec in &specs {
        let detected = spec_data_types.get(spec).copied().unwrap_or_default();
        for phase in Phase::PROGRESSION {
            let bis = by_spec_phase
                .get(&(*spec, phase))
                .and_then(|entries| {
                    entries
                        .iter()
                        .find(|guide| guide.guide_type == GuideType::Bis)
                })
                .copied();

            let slot_count = bis.map(|guide| guide.slot_count).unwrap_or(0);
            let missing_expected = bis
                .map(|guide| guide.missing_expected_slots.clone())
                .unwrap_or_else(|| expected_slots(class_for_spec(spec)));

            let presence = [
                bis.is_some() && slot_count > 0,
                detected.enchants,
                detected.gems,
                detected.overrides,
                detected.stat_weights,
            ];
            let missing_data_types = DATA_TYPE_NAMES
                .iter()
                .zip(presence)
                .filter(|(_, present)| !present)
                .map(|(name, _)| name.to_string())
                .collect();

            phase_coverage.push(PhaseCoverageRow {
                spec: spec.to_string(),
                phase,
                bis_guide_found: bis.is_some(),
                slot_count,
                missing_expected_slots: missing_expected,
                missing_data_types,
            });
        }
    }

    CoverageSummary {
        spec_count: specs.len(),
        guide_count: guides.len(),
        phase_coverage,
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

pub(super) fn render_report(guides: &[GuideRecord], coverage: &CoverageSummary) -> String {
    let mut lines = vec![
        "# Wowhead Guide Coverage Report".to_string(),
        String::new(),
        format!("- Total guides parsed: {}", coverage.guide_count),
        format!("- Total specs discovered: {}", coverage.spec_count),
        String::new(),
        "## Spec/Phase Completeness".to_string(),
        String::new(),
        "| Spec | Phase | BiS Guide | Slots | Missing Data Types |".to_string(),
        "|---|---|---:|---:|---|".to_string(),
    ];

    for row in &coverage.phase_coverage {
        let missing = if row.missing_data_types.is_empty() {
            "none".to_string()
        } else {
            row.missing_data_types.join(", ")
        };
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            row.spec,
            row.phase,
            yes_no(row.bis_guide_found),
            row.slot_count,
            missing
        ));
    }

    lines.push(String::new());
    lines.push("## Guides With Slot Parsing Gaps".to_string());
    lines.push(String::new());

    let gaps = guides
        .iter()
        .filter(|guide| guide.guide_type == GuideType::Bis)
        .filter(|guide| guide.parse_error.is_some() || !guide.unparsed_slot_like_headers.is_empty())
        .collect::<Vec<&GuideRecord>>();
    if gaps.is_empty() {
        lines.push("- None detected".to_string());
    }
    for guide in gaps {
        let mut problems = Vec::new();
        if let Some(error) = &guide.parse_error {
            problems.push(format!("parse_error={error}"));
        }
        if !guide.unparsed_slot_like_headers.is_empty() {
            problems.push(format!(
                "unparsed_headers={}",
                guide.unparsed_slot_like_headers.join(", ")
            ));
        }
        lines.push(format!("- `{}`: {}", guide.file, problems.join("; ")));
    }

    lines.push(String::new());
    lines.push("## Guide Data-Type Detection".to_string());
    lines.push(String::new());
    lines.push("| File | Type | Gems | Enchants | Stat Weights | Overrides |".to_string());
    lines.push("|---|---|---:|---:|---:|---:|".to_string());
    for guide in guides {
        let detected = guide.data_types_detected;
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} |",
            guide.file,
            guide.guide_type.as_str(),
            yes_no(detected.gems),
            yes_no(detected.enchants),
            yes_no(detected.stat_weights),
            yes_no(detected.overrides)
        ));
    }
    lines.push(String::new());

    lines.join("\n")
}
