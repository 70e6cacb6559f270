use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Item,
    Spell,
    Enchant,
}

impl RefKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RefKind::Item => "item",
            RefKind::Spell => "spell",
            RefKind::Enchant => "enchant",
        }
    }

    fn parse(value: &str) -> Option<RefKind> {
        match value.to_ascii_lowercase().as_str() {
            "item" => Some(RefKind::Item),
            "spell" => Some(RefKind::Spell),
            "enchant" => Some(RefKind::Enchant),
            _ => None,
        }
    }
}

/// An inline `[item=N]`, `[spell=N]` or `[enchant=N]` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub kind: RefKind,
    pub id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    /// `[h3 toc="..."]`: the toc attribute is the title.
    Toc,
    /// `[h4]...[/h4]`: the cleaned inner text is the title.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: HeadingLevel,
    pub title: String,
    pub start: usize,
    pub end: usize,
}

/// Markup between one heading and the next (or the end of the payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub heading: String,
    pub level: HeadingLevel,
    pub body: &'a str,
}

/// Lazy, case-insensitive scanners for the guide pseudo-tag grammar.
pub struct MarkupGrammar {
    toc_heading: Regex,
    plain_heading: Regex,
    table: Regex,
    row: Regex,
    cell: Regex,
    reference: Regex,
    tag: Regex,
}

impl MarkupGrammar {
    pub fn new() -> Result<Self> {
        Ok(Self {
            toc_heading: Regex::new(r#"(?is)\[h3[^\]]*toc="([^"]+)"[^\]]*\].*?\[/h3\]"#)
                .context("failed to compile toc heading regex")?,
            plain_heading: Regex::new(r"(?is)\[h4[^\]]*\](.*?)\[/h4\]")
                .context("failed to compile plain heading regex")?,
            table: Regex::new(r"(?is)\[table[^\]]*\](.*?)\[/table\]")
                .context("failed to compile table regex")?,
            row: Regex::new(r"(?is)\[tr(?:\s[^\]]*)?\](.*?)\[/tr\]")
                .context("failed to compile row regex")?,
            cell: Regex::new(r"(?is)\[td(?:\s[^\]]*)?\](.*?)\[/td\]")
                .context("failed to compile cell regex")?,
            reference: Regex::new(r"(?i)\[(item|spell|enchant)=\s*(\d+)\s*(?:\s[^\]]*)?\]")
                .context("failed to compile reference regex")?,
            tag: Regex::new(r"\[[^\]]+\]").context("failed to compile tag regex")?,
        })
    }

    /// Headings of both levels, ordered by position.
    pub fn headings(&self, markup: &str) -> Vec<Heading> {
        let mut headings = Vec::new();

        for captures in self.toc_heading.captures_iter(markup) {
            let (Some(whole), Some(title)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            headings.push(Heading {
                level: HeadingLevel::Toc,
                title: title.as_str().trim().to_string(),
                start: whole.start(),
                end: whole.end(),
            });
        }

        for captures in self.plain_heading.captures_iter(markup) {
            let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            headings.push(Heading {
                level: HeadingLevel::Plain,
                title: self.clean_text(inner.as_str()),
                start: whole.start(),
                end: whole.end(),
            });
        }

        headings.sort_by_key(|heading| heading.start);
        headings
    }

    pub fn sections<'a>(&self, markup: &'a str) -> Vec<Section<'a>> {
        let headings = self.headings(markup);
        let mut sections = Vec::with_capacity(headings.len());

        for (index, heading) in headings.iter().enumerate() {
            let body_end = headings
                .get(index + 1)
                .map(|next| next.start)
                .unwrap_or(markup.len());
            // A plain heading nested inside a toc heading starts before the
            // outer one ends; such an outer section is simply empty.
            let body_start = heading.end.min(body_end);

            sections.push(Section {
                heading: heading.title.clone(),
                level: heading.level,
                body: &markup[body_start..body_end],
            });
        }

        sections
    }

    pub fn toc_titles(&self, markup: &str) -> Vec<String> {
        self.headings(markup)
            .into_iter()
            .filter(|heading| heading.level == HeadingLevel::Toc)
            .map(|heading| heading.title)
            .collect()
    }

    pub fn tables<'a>(&self, text: &'a str) -> Vec<&'a str> {
        inner_blocks(&self.table, text)
    }

    pub fn rows<'a>(&self, table_body: &'a str) -> Vec<&'a str> {
        inner_blocks(&self.row, table_body)
    }

    pub fn cells<'a>(&self, row_body: &'a str) -> Vec<&'a str> {
        inner_blocks(&self.cell, row_body)
    }

    /// All references in document order, duplicates included.
    pub fn references(&self, text: &str) -> Vec<Reference> {
        self.reference
            .captures_iter(text)
            .filter_map(|captures| {
                let kind = RefKind::parse(captures.get(1)?.as_str())?;
                let id = captures.get(2)?.as_str().parse::<u32>().ok()?;
                Some(Reference { kind, id })
            })
            .collect()
    }

    pub fn references_of(&self, text: &str, kind: RefKind) -> Vec<u32> {
        self.references(text)
            .into_iter()
            .filter(|reference| reference.kind == kind)
            .map(|reference| reference.id)
            .collect()
    }

    /// Strips every pseudo-tag and collapses whitespace.
    pub fn clean_text(&self, text: &str) -> String {
        let without_tags = self.tag.replace_all(text, "");
        without_tags.split_whitespace().collect::<Vec<&str>>().join(" ")
    }
}

fn inner_blocks<'a>(pattern: &Regex, text: &'a str) -> Vec<&'a str> {
    pattern
        .captures_iter(text)
        .filter_map(|captures| captures.get(1).map(|inner| inner.as_str()))
        .collect()
}
