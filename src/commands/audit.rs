use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::AuditArgs;
use crate::commands::ingest;
use crate::guide::coverage::{AuditThresholds, audit_phase_maps};
use crate::guide::title::{ClassToken, class_for_spec};
use crate::model::{BatchManifest, SpecFindings};
use crate::util::read_json;

pub fn run(args: AuditArgs) -> Result<()> {
    let batch_path = args
        .batch_path
        .clone()
        .unwrap_or_else(|| ingest::default_batch_path(&args.cache_root));
    let only_class = match &args.only_class {
        Some(name) => match ClassToken::from_name(name) {
            Some(class) => Some(class),
            None => bail!("unknown class: {name}"),
        },
        None => None,
    };
    let thresholds = AuditThresholds {
        min_slot_count: args.min_slot_count,
        max_slot_drop: args.max_slot_drop,
        max_rank_drop_pct: args.max_rank_drop_pct,
    };

    let batch: BatchManifest = read_json(&batch_path)?;
    let flagged = audit_batch(&batch, &thresholds, only_class);

    let mut stdout = io::stdout().lock();
    let rendered = if args.json {
        let mut json =
            serde_json::to_string_pretty(&flagged).context("failed to serialize audit findings")?;
        json.push('\n');
        json
    } else {
        render_findings(&flagged)
    };
    stdout
        .write_all(rendered.as_bytes())
        .context("failed to write audit findings")?;

    info!(
        specs_flagged = flagged.len(),
        findings = flagged.iter().map(|spec| spec.findings.len()).sum::<usize>(),
        "audit completed"
    );
    Ok(())
}

/// Specs with at least one finding, in spec order.
pub fn audit_batch(
    batch: &BatchManifest,
    thresholds: &AuditThresholds,
    only_class: Option<ClassToken>,
) -> Vec<SpecFindings> {
    batch
        .spec_phase_maps()
        .into_iter()
        .filter(|(spec, _)| only_class.is_none() || class_for_spec(spec) == only_class)
        .map(|(spec, phases)| SpecFindings {
            findings: audit_phase_maps(&phases, thresholds),
            spec,
        })
        .filter(|spec| !spec.findings.is_empty())
        .collect()
}

pub fn render_findings(flagged: &[SpecFindings]) -> String {
    if flagged.is_empty() {
        return "No suspicious entries found.\n".to_string();
    }

    let mut out = format!("Suspicious spec entries: {}\n", flagged.len());
    for spec in flagged {
        out.push_str(&format!("\n[{}]\n", spec.spec));
        for finding in &spec.findings {
            out.push_str(&format!(
                "  - {}: {} (phase {}) -> {}\n",
                finding.severity.as_str(),
                finding.kind.as_str(),
                finding.phase,
                finding.detail
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::guide::coverage::{DataTypesDetected, Finding, FindingKind, Severity};
    use crate::guide::title::{GuideType, Phase};
    use crate::model::{CoverageSummary, GuideRecord};

    use super::*;

    fn empty_record(spec: &str, phase: Phase, parse_error: Option<&str>) -> GuideRecord {
        GuideRecord {
            spec: spec.to_string(),
            phase,
            guide_type: GuideType::Bis,
            applies_to_specs: vec![spec.to_string()],
            file: format!("{spec} {phase}.html"),
            sha256: String::new(),
            parse_error: parse_error.map(str::to_string),
            slots: Vec::new(),
            slot_count: 0,
            item_count: 0,
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
            generated_at: String::new(),
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
    fn audit_batch_filters_by_class() {
        let batch = batch(vec![
            empty_record("Holy Paladin Healing", Phase::P1, Some("could not find markup")),
            empty_record("Fury Warrior DPS", Phase::P1, None),
        ]);

        let all = audit_batch(&batch, &AuditThresholds::default(), None);
        assert_eq!(all.len(), 2);

        let paladin = audit_batch(&batch, &AuditThresholds::default(), Some(ClassToken::Paladin));
        assert_eq!(paladin.len(), 1);
        assert_eq!(paladin[0].spec, "Holy Paladin Healing");
        assert!(
            paladin[0]
                .findings
                .iter()
                .any(|finding| finding.kind == FindingKind::EmptyPhaseParse && finding.phase == 1)
        );
        assert_eq!(
            paladin[0]
                .findings
                .iter()
                .filter(|finding| finding.kind == FindingKind::MissingPhaseGuide)
                .count(),
            4
        );
    }

    #[test]
    fn render_findings_formats_text_report() {
        let flagged = vec![SpecFindings {
            spec: "Fury Warrior DPS".to_string(),
            findings: vec![Finding {
                severity: Severity::Medium,
                kind: FindingKind::LowSlotCoverage,
                phase: 2,
                detail: "9 slots (< 14)".to_string(),
            }],
        }];

        let text = render_findings(&flagged);

        assert!(text.starts_with("Suspicious spec entries: 1\n"));
        assert!(text.contains("[Fury Warrior DPS]"));
        assert!(text.contains("  - medium: low_slot_coverage (phase 2) -> 9 slots (< 14)"));
        assert_eq!(render_findings(&[]), "No suspicious entries found.\n");
    }
}
