use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::RefsArgs;
use crate::guide::GuideParser;
use crate::guide::markup::RefKind;
use crate::util::read_page;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRefs {
    pub path: String,
    pub markup_found: bool,
    pub item_ids: Vec<u32>,
    pub spell_ids: Vec<u32>,
    pub enchant_ids: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRefs {
    fn without_markup(path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
            markup_found: false,
            item_ids: Vec::new(),
            spell_ids: Vec::new(),
            enchant_ids: Vec::new(),
            markup_length: None,
            error: None,
        }
    }
}

pub fn run(args: RefsArgs) -> Result<()> {
    let parser = GuideParser::new()?;

    let results = collect_refs(&parser, &args.input_html);

    let mut stdout = io::stdout().lock();
    if args.json {
        let rendered = if results.len() == 1 {
            serde_json::to_string_pretty(&results[0])
        } else {
            serde_json::to_string_pretty(&results)
        }
        .context("failed to serialize reference listing")?;
        writeln!(stdout, "{rendered}").context("failed to write reference listing")?;
    } else {
        for refs in &results {
            write!(stdout, "{}", render_text(refs)).context("failed to write reference listing")?;
        }
    }

    info!(pages = results.len(), "reference listing complete");
    Ok(())
}

/// One listing per input; a page that cannot be read gets an error entry
/// and the rest are still listed.
pub fn collect_refs(parser: &GuideParser, paths: &[PathBuf]) -> Vec<PageRefs> {
    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let refs = match read_page(path) {
            Ok((page, _)) => page_refs(parser, path, &page),
            Err(err) => {
                let error = format!("{err:#}");
                warn!(path = %path.display(), error = %error, "failed to read page");
                PageRefs {
                    error: Some(error),
                    ..PageRefs::without_markup(path)
                }
            }
        };
        if refs.error.is_none() && !refs.markup_found {
            warn!(path = %path.display(), "page carries no guide markup");
        }
        results.push(refs);
    }
    results
}

pub fn page_refs(parser: &GuideParser, path: &Path, page: &str) -> PageRefs {
    let Ok(markup) = parser.extract_markup(page) else {
        return PageRefs::without_markup(path);
    };

    let mut refs: BTreeMap<RefKind, Vec<u32>> = parser.unique_refs(&markup);
    let mut take = |kind: RefKind| refs.remove(&kind).unwrap_or_default();
    PageRefs {
        path: path.display().to_string(),
        markup_found: true,
        item_ids: take(RefKind::Item),
        spell_ids: take(RefKind::Spell),
        enchant_ids: take(RefKind::Enchant),
        markup_length: Some(markup.chars().count()),
        error: None,
    }
}

fn render_text(refs: &PageRefs) -> String {
    let join = |ids: &[u32]| {
        ids.iter()
            .map(u32::to_string)
            .collect::<Vec<String>>()
            .join(", ")
    };

    let mut out = format!("\n--- {} ---\n", refs.path);
    if let Some(error) = &refs.error {
        out.push_str(&format!("  error: {error}\n"));
        return out;
    }
    if !refs.markup_found {
        out.push_str("  no guide markup found\n");
        return out;
    }
    out.push_str(&format!("  items ({}): {}\n", refs.item_ids.len(), join(&refs.item_ids)));
    out.push_str(&format!("  spells ({}): {}\n", refs.spell_ids.len(), join(&refs.spell_ids)));
    out.push_str(&format!(
        "  enchants ({}): {}\n",
        refs.enchant_ids.len(),
        join(&refs.enchant_ids)
    ));
    out
}
