pub mod classify;
pub mod coverage;
pub mod error;
pub mod extract;
pub mod locator;
pub mod markup;
pub mod merge;
pub mod slot;
pub mod title;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use self::error::{GuideDiagnostic, GuideError};
use self::extract::{ExtractedGuide, extract_by_slot};
use self::locator::{ItemLookup, PageLocator};
use self::markup::{MarkupGrammar, RefKind};
use self::slot::SectionTarget;
use self::title::GuideType;

/// One saved guide page after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGuide {
    pub extracted: ExtractedGuide,
    /// Top-level (toc) headings, the ones coverage inspects.
    pub toc_headings: Vec<String>,
    pub lookup_size: usize,
}

impl ParsedGuide {
    pub fn parsed_targets(&self) -> BTreeSet<SectionTarget> {
        self.extracted
            .slots
            .iter()
            .map(|ranking| ranking.target)
            .collect()
    }
}

/// Compiled scanners shared across every page of a run.
pub struct GuideParser {
    locator: PageLocator,
    grammar: MarkupGrammar,
}

impl GuideParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            locator: PageLocator::new()?,
            grammar: MarkupGrammar::new()?,
        })
    }

    pub fn extract_markup(&self, page: &str) -> Result<String, GuideError> {
        self.locator.extract_markup(page)
    }

    pub fn parse_page(&self, page: &str, guide_type: GuideType) -> Result<ParsedGuide, GuideError> {
        let markup = self.locator.extract_markup(page)?;
        let lookup = self.locator.extract_item_lookup(page);
        Ok(self.parse_markup(&markup, lookup.as_ref(), guide_type))
    }

    pub fn parse_markup(
        &self,
        markup: &str,
        lookup: Option<&ItemLookup>,
        guide_type: GuideType,
    ) -> ParsedGuide {
        let empty = ItemLookup::default();
        let mut extracted =
            extract_by_slot(&self.grammar, markup, lookup.unwrap_or(&empty), guide_type);
        if lookup.is_none() {
            extracted.diagnostics.insert(0, GuideDiagnostic::ItemLookupAbsent);
        }

        ParsedGuide {
            extracted,
            toc_headings: self.grammar.toc_titles(markup),
            lookup_size: lookup.map(ItemLookup::name_count).unwrap_or(0),
        }
    }

    /// Distinct reference ids per kind, ascending.
    pub fn unique_refs(&self, markup: &str) -> BTreeMap<RefKind, Vec<u32>> {
        let mut refs: BTreeMap<RefKind, BTreeSet<u32>> = BTreeMap::new();
        for reference in self.grammar.references(markup) {
            refs.entry(reference.kind).or_default().insert(reference.id);
        }
        refs.into_iter()
            .map(|(kind, ids)| (kind, ids.into_iter().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests;
