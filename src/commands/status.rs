use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::{ingest, inventory, tables};
use crate::model::GuideInventoryManifest;
use crate::util::read_json;

/// Fields of an ingest run manifest that status reports.
#[derive(Debug, Deserialize)]
struct IngestRunSummary {
    run_id: String,
    status: String,
    updated_at: String,
    #[serde(default)]
    warnings: Vec<String>,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let inventory_path = inventory::default_manifest_path(&args.cache_root);
    let batch_path = ingest::default_batch_path(&args.cache_root);
    let tables_path = tables::default_tables_path(&args.cache_root);
    let db_path = ingest::default_db_path(&args.cache_root);

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let inventory: GuideInventoryManifest = read_json(&inventory_path)?;
        info!(
            generated_at = %inventory.generated_at,
            guide_count = inventory.guide_count,
            skipped = inventory.skipped_files.len(),
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_ingest_manifest(&args.cache_root.join("manifests"))? {
        Some(path) => {
            let run: IngestRunSummary = read_json(&path)?;
            info!(
                path = %path.display(),
                run_id = %run.run_id,
                status = %run.status,
                updated_at = %run.updated_at,
                warnings = run.warnings.len(),
                "latest ingest run"
            );
        }
        None => warn!("no ingest run manifest found"),
    }

    for (label, path) in [("batch", &batch_path), ("tables", &tables_path)] {
        if path.exists() {
            info!(artifact = label, path = %path.display(), "artifact present");
        } else {
            warn!(artifact = label, path = %path.display(), "artifact missing");
        }
    }

    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let guides_count = query_count(&conn, "SELECT COUNT(*) FROM guides").unwrap_or(0);
        let failed_count =
            query_count(&conn, "SELECT COUNT(*) FROM guides WHERE parse_error IS NOT NULL")
                .unwrap_or(0);
        let items_count = query_count(&conn, "SELECT COUNT(*) FROM slot_items").unwrap_or(0);

        info!(
            path = %db_path.display(),
            guides = guides_count,
            failed_guides = failed_count,
            slot_items = items_count,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Newest `ingest_run_<ts>.json`; the compact timestamps sort lexically.
fn latest_ingest_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<PathBuf> = None;
    for entry in fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?
    {
        let path = entry?.path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("ingest_run_") && name.ends_with(".json"));
        if is_run_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_ingest_manifest_picks_newest_timestamp() {
        let dir = std::env::temp_dir().join(format!(
            "biscore-status-test-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("temp dir should be created");
        for name in [
            "ingest_run_20260101T000000Z.json",
            "ingest_run_20260301T120000Z.json",
            "guide_batch.json",
        ] {
            fs::write(dir.join(name), "{}").expect("fixture should be written");
        }

        let latest = latest_ingest_manifest(&dir).expect("listing should succeed");

        assert_eq!(latest, Some(dir.join("ingest_run_20260301T120000Z.json")));
        assert_eq!(
            latest_ingest_manifest(&dir.join("missing")).expect("missing dir is fine"),
            None
        );
        let _ = fs::remove_dir_all(&dir);
    }
}
