use super::*;

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let guides_dir = args
        .guides_dir
        .clone()
        .unwrap_or_else(|| cache_root.join("guides"));
    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_manifest_path(&cache_root));
    let batch_path = args
        .batch_path
        .clone()
        .unwrap_or_else(|| default_batch_path(&cache_root));
    let report_path = args
        .report_path
        .clone()
        .unwrap_or_else(|| cache_root.join("reports").join("coverage_report.md"));
    let ingest_manifest_path = args.ingest_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&cache_root));

    info!(cache_root = %cache_root.display(), run_id = %run_id, "starting ingest");

    let inventory =
        load_or_refresh_inventory(&guides_dir, &inventory_manifest_path, args.refresh_inventory)?;

    let parser = GuideParser::new()?;
    let rules = CoverageRules::new()?;
    let mut warnings = Vec::new();
    let mut guides = Vec::with_capacity(inventory.guides.len());

    for entry in &inventory.guides {
        let record = build_guide_record(&parser, &rules, &guides_dir, entry);
        if let Some(error) = &record.parse_error {
            warn!(file = %record.file, error = %error, "guide extraction failed");
            warnings.push(format!("{}: {error}", record.file));
        } else if record.sha256 != entry.sha256 {
            warn!(file = %record.file, "guide changed since inventory");
            warnings.push(format!("{}: sha256 changed since inventory", record.file));
        }
        guides.push(record);
    }

    let merged_specs = build_merged_specs(&guides);
    let coverage = summarize_coverage(&guides);
    let updated_at = now_utc_string();

    let batch = BatchManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        generated_at: updated_at.clone(),
        guides,
        merged_specs,
        coverage,
    };
    write_json_pretty(&batch_path, &batch)?;
    info!(path = %batch_path.display(), "wrote batch output");

    write_text(&report_path, &render_report(&batch.guides, &batch.coverage))?;
    info!(path = %report_path.display(), "wrote coverage report");

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    let slot_rows_inserted = upsert_guides(&mut connection, &batch.guides)?;

    let guides_total = count_rows(&connection, "SELECT COUNT(*) FROM guides")?;
    let slot_items_total = count_rows(&connection, "SELECT COUNT(*) FROM slot_items")?;

    let failed_guide_count = batch
        .guides
        .iter()
        .filter(|guide| guide.parse_error.is_some())
        .count();

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: if failed_guide_count == 0 {
            "completed".to_string()
        } else {
            "completed_with_failures".to_string()
        },
        started_at,
        updated_at,
        command: render_ingest_command(&args),
        paths: IngestPaths {
            cache_root: cache_root.display().to_string(),
            guides_dir: guides_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            batch_path: batch_path.display().to_string(),
            report_path: report_path.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        counts: IngestCounts {
            guide_count: inventory.guide_count,
            parsed_guide_count: batch.guides.len() - failed_guide_count,
            failed_guide_count,
            spec_count: batch.coverage.spec_count,
            slot_rows_inserted,
            guides_total,
            slot_items_total,
        },
        source_hashes: inventory.guides,
        warnings,
    };

    write_json_pretty(&ingest_manifest_path, &manifest)?;

    info!(path = %ingest_manifest_path.display(), "wrote ingest run manifest");
    info!(
        guides = guides_total,
        slot_items = slot_items_total,
        failed = failed_guide_count,
        "ingest completed"
    );

    Ok(())
}

pub fn default_batch_path(cache_root: &Path) -> std::path::PathBuf {
    cache_root.join("manifests").join("guide_batch.json")
}

pub fn default_db_path(cache_root: &Path) -> std::path::PathBuf {
    cache_root.join("biscore_index.sqlite")
}

fn load_or_refresh_inventory(
    guides_dir: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<GuideInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(guides_dir)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            guide_count = manifest.guide_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let manifest: GuideInventoryManifest = read_json(inventory_manifest_path)?;
    info!(
        path = %inventory_manifest_path.display(),
        guide_count = manifest.guide_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

/// Extracts one inventoried page. Read and markup failures produce a record
/// with `parse_error` set instead of an error.
pub(super) fn build_guide_record(
    parser: &GuideParser,
    rules: &CoverageRules,
    guides_dir: &Path,
    entry: &GuideEntry,
) -> GuideRecord {
    let path = guides_dir.join(&entry.filename);
    let class = class_for_spec(&entry.spec);

    let (page, sha256) = match read_page(&path) {
        Ok(read) => read,
        Err(err) => return failed_record(entry, entry.sha256.clone(), format!("{err:#}")),
    };
    let parsed = match parser.parse_page(&page, entry.guide_type) {
        Ok(parsed) => parsed,
        Err(err) => return failed_record(entry, sha256, err.to_string()),
    };

    let targets = parsed.parsed_targets();
    let slots: Vec<SlotRanking> = parsed.extracted.slots.clone();
    GuideRecord {
        spec: entry.spec.clone(),
        phase: entry.phase,
        guide_type: entry.guide_type,
        applies_to_specs: entry.applies_to_specs.clone(),
        file: entry.filename.clone(),
        sha256,
        parse_error: None,
        slot_count: slots.len(),
        item_count: parsed.extracted.item_count(),
        slots,
        missing_expected_slots: missing_expected_slots(&targets, class),
        unparsed_slot_like_headers: rules.detect_slot_like_unparsed(
            &parsed.toc_headings,
            &targets,
            entry.guide_type,
        ),
        data_types_detected: rules.detect_data_types(&parsed.toc_headings, entry.guide_type),
        diagnostics: parsed.extracted.diagnostics,
    }
}

fn failed_record(entry: &GuideEntry, sha256: String, error: String) -> GuideRecord {
    let missing: Vec<Slot> = expected_slots(class_for_spec(&entry.spec));
    GuideRecord {
        spec: entry.spec.clone(),
        phase: entry.phase,
        guide_type: entry.guide_type,
        applies_to_specs: entry.applies_to_specs.clone(),
        file: entry.filename.clone(),
        sha256,
        parse_error: Some(error),
        slots: Vec::new(),
        slot_count: 0,
        item_count: 0,
        missing_expected_slots: missing,
        unparsed_slot_like_headers: Vec::new(),
        data_types_detected: DataTypesDetected::default(),
        diagnostics: Vec::new(),
    }
}

pub(super) fn build_merged_specs(guides: &[GuideRecord]) -> Vec<MergedSpecRecord> {
    spec_phase_maps(guides)
        .into_iter()
        .map(|(spec, phases)| MergedSpecRecord {
            spec,
            phases: merge_phase_chain(&phases),
        })
        .collect()
}

fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "biscore".to_string(),
        "ingest".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];
    let optional_paths = [
        ("--guides-dir", &args.guides_dir),
        ("--inventory-manifest-path", &args.inventory_manifest_path),
        ("--batch-path", &args.batch_path),
        ("--report-path", &args.report_path),
        ("--ingest-manifest-path", &args.ingest_manifest_path),
        ("--db-path", &args.db_path),
    ];
    for (flag, path) in optional_paths {
        if let Some(path) = path {
            command.push(flag.to_string());
            command.push(path.display().to_string());
        }
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }

    command.join(" ")
}
