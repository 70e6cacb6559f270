use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ExtractArgs;
use crate::guide::GuideParser;
use crate::guide::error::GuideDiagnostic;
use crate::guide::extract::SlotRanking;
use crate::util::{read_page, write_text};

#[derive(Debug, Serialize)]
struct ExtractOutput<'a> {
    source_file: String,
    slots: &'a [SlotRanking],
    total_slots: usize,
    total_items: usize,
    diagnostics: &'a [GuideDiagnostic],
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let parser = GuideParser::new()?;
    let (page, _) = read_page(&args.input_html)?;

    let parsed = parser
        .parse_page(&page, args.guide_type)
        .with_context(|| format!("failed to extract {}", args.input_html.display()))?;

    for diagnostic in &parsed.extracted.diagnostics {
        warn!(file = %args.input_html.display(), diagnostic = ?diagnostic, "extraction diagnostic");
    }

    let output = ExtractOutput {
        source_file: args.input_html.display().to_string(),
        slots: &parsed.extracted.slots,
        total_slots: parsed.extracted.slots.len(),
        total_items: parsed.extracted.item_count(),
        diagnostics: &parsed.extracted.diagnostics,
    };

    let mut rendered = if args.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .context("failed to serialize extraction output")?;
    rendered.push('\n');

    match &args.output {
        Some(path) => {
            write_text(path, &rendered)?;
            info!(
                path = %path.display(),
                slots = output.total_slots,
                items = output.total_items,
                "wrote extraction output"
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .context("failed to write extraction output")?;
        }
    }

    Ok(())
}
