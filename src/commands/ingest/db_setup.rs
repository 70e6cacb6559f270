use super::*;

pub(super) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub(super) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS guides (
          guide_id TEXT PRIMARY KEY,
          spec TEXT NOT NULL,
          phase TEXT NOT NULL,
          guide_type TEXT NOT NULL,
          sha256 TEXT NOT NULL,
          parse_error TEXT,
          slot_count INTEGER NOT NULL DEFAULT 0,
          item_count INTEGER NOT NULL DEFAULT 0,
          ingested_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS slot_items (
          guide_id TEXT NOT NULL,
          slot TEXT NOT NULL,
          item_order INTEGER NOT NULL,
          tie_group_index INTEGER NOT NULL,
          rank_label TEXT NOT NULL,
          ref_type TEXT NOT NULL,
          ref_id INTEGER NOT NULL,
          item_name TEXT,
          source TEXT,
          PRIMARY KEY (guide_id, slot, ref_type, ref_id),
          FOREIGN KEY (guide_id) REFERENCES guides(guide_id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_guides_spec_phase ON guides(spec, phase);
        CREATE INDEX IF NOT EXISTS idx_slot_items_ref ON slot_items(ref_type, ref_id);
        ",
        )
        .context("failed to initialize guide index schema")?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

/// Upserts every guide and replaces its ranked rows. Returns the number of
/// slot rows written.
pub(super) fn upsert_guides(connection: &mut Connection, guides: &[GuideRecord]) -> Result<usize> {
    let ingested_at = now_utc_string();
    let tx = connection.transaction()?;
    let mut inserted = 0;

    {
        let mut upsert_guide = tx.prepare(
            "
            INSERT INTO guides(guide_id, spec, phase, guide_type, sha256, parse_error, slot_count, item_count, ingested_at)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(guide_id) DO UPDATE SET
              spec=excluded.spec,
              phase=excluded.phase,
              guide_type=excluded.guide_type,
              sha256=excluded.sha256,
              parse_error=excluded.parse_error,
              slot_count=excluded.slot_count,
              item_count=excluded.item_count,
              ingested_at=excluded.ingested_at
            ",
        )?;
        let mut clear_items = tx.prepare("DELETE FROM slot_items WHERE guide_id = ?1")?;
        let mut insert_item = tx.prepare(
            "
            INSERT OR IGNORE INTO slot_items(guide_id, slot, item_order, tie_group_index, rank_label, ref_type, ref_id, item_name, source)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )?;

        for guide in guides {
            upsert_guide
                .execute(params![
                    &guide.file,
                    &guide.spec,
                    guide.phase.as_str(),
                    guide.guide_type.as_str(),
                    &guide.sha256,
                    &guide.parse_error,
                    guide.slot_count as i64,
                    guide.item_count as i64,
                    &ingested_at,
                ])
                .with_context(|| format!("failed to upsert guide {}", guide.file))?;
            clear_items.execute([&guide.file])?;

            for ranking in &guide.slots {
                for entry in ranking.entries() {
                    inserted += insert_item.execute(params![
                        &guide.file,
                        ranking.target.as_str(),
                        entry.order,
                        entry.tie_group_index as i64,
                        &entry.rank,
                        entry.ref_type.as_str(),
                        entry.ref_id,
                        &entry.item_name,
                        &entry.source,
                    ])?;
                }
            }
        }
    }

    tx.commit()?;
    Ok(inserted)
}

pub(super) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed to count rows: {sql}"))
}
