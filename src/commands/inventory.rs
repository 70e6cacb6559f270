use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::guide::title::{TitleParser, expand_spec_targets};
use crate::model::{GuideEntry, GuideInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let guides_dir = args
        .guides_dir
        .clone()
        .unwrap_or_else(|| args.cache_root.join("guides"));
    let manifest = build_manifest(&guides_dir)?;

    if args.dry_run {
        info!(
            guide_count = manifest.guide_count,
            skipped = manifest.skipped_files.len(),
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.cache_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(guide_count = manifest.guide_count, "inventory completed");

    Ok(())
}

pub fn default_manifest_path(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests").join("guide_inventory.json")
}

pub fn build_manifest(guides_dir: &Path) -> Result<GuideInventoryManifest> {
    let titles = TitleParser::new()?;

    let mut page_paths = discover_pages(guides_dir)?;
    page_paths.sort();

    if page_paths.is_empty() {
        bail!("no saved guide pages found in {}", guides_dir.display());
    }

    let mut guides = Vec::with_capacity(page_paths.len());
    let mut skipped_files = Vec::new();
    for path in page_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let Some(title) = titles.parse(&filename) else {
            warn!(file = %filename, "page title matches no known guide pattern");
            skipped_files.push(filename);
            continue;
        };

        let sha256 = sha256_file(&path)?;
        guides.push(GuideEntry {
            applies_to_specs: expand_spec_targets(&title.spec, title.guide_type),
            filename,
            spec: title.spec,
            phase: title.phase,
            guide_type: title.guide_type,
            sha256,
        });
    }

    guides.sort_by(|a, b| {
        a.spec
            .cmp(&b.spec)
            .then(a.phase.cmp(&b.phase))
            .then(a.filename.cmp(&b.filename))
    });

    Ok(GuideInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: guides_dir.display().to_string(),
        guide_count: guides.len(),
        guides,
        skipped_files,
    })
}

fn discover_pages(guides_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();

    let entries = fs::read_dir(guides_dir)
        .with_context(|| format!("failed to read {}", guides_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", guides_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_html = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("html"))
            .unwrap_or(false);

        if is_html {
            pages.push(path);
        }
    }

    Ok(pages)
}
