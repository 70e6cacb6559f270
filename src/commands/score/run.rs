use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;

use super::armory::{ArmorySnapshot, ArmoryTranslator, parse_character_url};
use super::engine::RankedTableScorer;
use super::{ScoreRequest, ScoreResult, ScoringEngine};
use crate::cli::ScoreArgs;
use crate::commands::tables;
use crate::guide::title::ClassToken;
use crate::model::BisTables;
use crate::util::{read_json, write_json_pretty};

#[derive(Debug, Clone, Serialize)]
pub struct ScoreMeta {
    pub url: Option<String>,
    pub region: Option<String>,
    pub flavor: Option<String>,
    pub realm: String,
    pub name: String,
    pub profile: String,
    pub class_name: String,
    pub phase: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreRecord {
    pub meta: ScoreMeta,
    pub score: ScoreResult,
}

pub fn run(args: ScoreArgs) -> Result<()> {
    let tables_path = args
        .tables_path
        .clone()
        .unwrap_or_else(|| tables::default_tables_path(&args.cache_root));
    let tables: BisTables = read_json(&tables_path)?;
    let snapshot: ArmorySnapshot = read_json(&args.snapshot_path)?;

    let locator = args
        .character_url
        .as_deref()
        .map(parse_character_url)
        .transpose()?;

    let Some(class) = ClassToken::from_name(&snapshot.character.class_name) else {
        bail!(
            "unknown character class in snapshot: {:?}",
            snapshot.character.class_name
        );
    };

    let translator = ArmoryTranslator::new()?;
    let equipment = translator.equipment_by_slot(&snapshot.equipment);
    info!(
        class = %class,
        profile = %args.profile,
        phase = args.phase,
        equipped = equipment.len(),
        "scoring character"
    );

    let scorer = RankedTableScorer::new(&tables);
    let score = scorer.score(&ScoreRequest {
        class,
        profile: &args.profile,
        phase: args.phase,
        equipment: &equipment,
    })?;

    let name = if snapshot.character.name.is_empty() {
        locator
            .as_ref()
            .map(|locator| locator.name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    } else {
        snapshot.character.name.clone()
    };
    let record = ScoreRecord {
        meta: ScoreMeta {
            url: locator.as_ref().map(|locator| locator.url.clone()),
            region: locator.as_ref().map(|locator| locator.region.clone()),
            flavor: locator.as_ref().map(|locator| locator.flavor.clone()),
            realm: locator
                .as_ref()
                .map(|locator| locator.realm.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            name,
            profile: args.profile.clone(),
            class_name: snapshot.character.class_name.clone(),
            phase: args.phase,
        },
        score,
    };

    io::stdout()
        .lock()
        .write_all(format_report(&record).as_bytes())
        .context("failed to write score report")?;

    if let Some(path) = &args.json_out {
        write_json_pretty(path, &record)?;
        info!(path = %path.display(), "wrote score record");
    }

    Ok(())
}

pub fn format_report(record: &ScoreRecord) -> String {
    let meta = &record.meta;
    let score = &record.score;

    let mut out = format!(
        "{} ({} - {}, {}, phase {}): {}/{} ({:.1}%), BiS anchors {}/{}\n",
        meta.name,
        meta.class_name,
        meta.profile,
        meta.realm,
        meta.phase,
        score.score,
        score.max_score,
        score.percent * 100.0,
        score.bis_slot_count,
        score.total_slots
    );
    out.push_str("  Legend: factor = item quality in that slot; slot = weighted slot progress.\n");
    out.push_str("  Slot breakdown:\n");

    for detail in score.details.values() {
        let item = match (&detail.item_name, detail.item_id) {
            (Some(name), Some(id)) => format!("{name} [{id}]"),
            (None, Some(id)) => format!("item [{id}]"),
            (Some(name), None) => name.clone(),
            (None, None) => "(empty)".to_string(),
        };
        let (points, points_max) = if score.sum_max > 0.0 && score.max_score > 0 {
            let scale = f64::from(score.max_score) / score.sum_max;
            (detail.slot_score * scale, detail.slot_max * scale)
        } else {
            (0.0, 0.0)
        };
        out.push_str(&format!(
            "    - {}: {} | {} | factor={:.3} | slot={:.3}/{:.3} | item points={:.1}/{:.1}\n",
            detail.slot,
            item,
            detail.label,
            detail.factor,
            detail.slot_score,
            detail.slot_max,
            points,
            points_max
        ));
    }

    out
}
