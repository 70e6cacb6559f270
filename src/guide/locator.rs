use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;

use super::error::GuideError;

/// Item id to display name, recovered from `WH.Gatherer.addData(3, 5, {...})`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemLookup {
    names: HashMap<u32, String>,
}

impl ItemLookup {
    pub fn name(&self, item_id: u32) -> Option<&str> {
        self.names.get(&item_id).map(String::as_str)
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    fn from_json_object(raw: &str) -> Option<Self> {
        let Value::Object(entries) = serde_json::from_str::<Value>(raw).ok()? else {
            return None;
        };

        let mut names = HashMap::with_capacity(entries.len());
        for (key, payload) in entries {
            let Ok(item_id) = key.trim().parse::<u32>() else {
                continue;
            };
            let name = match &payload {
                Value::String(name) => Some(name.as_str()),
                Value::Object(fields) => fields
                    .get("name_enus")
                    .and_then(Value::as_str)
                    .or_else(|| fields.get("name").and_then(Value::as_str)),
                _ => None,
            };
            if let Some(name) = name.filter(|value| !value.is_empty()) {
                names.insert(item_id, name.to_string());
            }
        }

        Some(Self { names })
    }
}

impl FromIterator<(u32, String)> for ItemLookup {
    fn from_iter<T: IntoIterator<Item = (u32, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Finds the guide payload and the item dictionary inside a saved page.
pub struct PageLocator {
    print_html: Regex,
    print_html_fallback: Regex,
    add_data: Regex,
}

impl PageLocator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            print_html: Regex::new(r#"(?s)WH\.markup\.printHtml\(\s*("(?:\\.|[^"\\])*")\s*(?:,|\))"#)
                .context("failed to compile printHtml regex")?,
            print_html_fallback: Regex::new(
                r#"(?s)WH\.markup\.printHtml\s*\(\s*"((?:[^"\\]|\\.){100,}?)""#,
            )
            .context("failed to compile printHtml fallback regex")?,
            add_data: Regex::new(r"(?s)WH\.Gatherer\.addData\(\s*3\s*,\s*5\s*,\s*(\{.*?\})\s*\);")
                .context("failed to compile addData regex")?,
        })
    }

    /// Returns the decoded pseudo-markup string of a guide page.
    pub fn extract_markup(&self, page: &str) -> Result<String, GuideError> {
        if let Some(literal) = self
            .print_html
            .captures(page)
            .and_then(|captures| captures.get(1))
        {
            return Ok(decode_string_literal(literal.as_str()));
        }

        // Concatenated payloads ("..." + "...") only close the first literal.
        self.print_html_fallback
            .captures(page)
            .and_then(|captures| captures.get(1))
            .map(|body| unescape_js_string(body.as_str()))
            .ok_or(GuideError::MarkupNotFound)
    }

    /// `None` when the page has no usable item dictionary.
    pub fn extract_item_lookup(&self, page: &str) -> Option<ItemLookup> {
        let raw = self.add_data.captures(page)?.get(1)?.as_str();
        ItemLookup::from_json_object(raw)
    }
}

/// Decodes a double-quoted JS string literal, quotes included.
///
/// Strict JSON decoding covers `\uXXXX`; literals carrying escapes JSON
/// rejects (such as `\'`) go through the lenient unescape instead.
pub fn decode_string_literal(quoted: &str) -> String {
    if let Ok(decoded) = serde_json::from_str::<String>(quoted) {
        return decoded;
    }

    let inner = quoted
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
        .unwrap_or(quoted);
    unescape_js_string(inner)
}

pub fn unescape_js_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('/') => out.push('/'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
