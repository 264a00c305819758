//! Scored keyword matching of operations against a tool catalog.
//!
//! A keyword scores one hit per whole-word, case-insensitive occurrence in the
//! searched text. Each of the long name, description and label is searched
//! independently; the best entry of a search has the most hits, ties going to
//! the entry listed first.
//!
//! The long name and description winners are compared by score. On equal
//! score the match made against the longer text wins, and on equal length the
//! long name match. The label search only decides when both score zero.

use geoflow_types::Operation;
use tracing::debug;

use crate::catalog::{CatalogEntry, ToolCatalog};
use crate::error::{Result, TranslateError};

/// The best entry of one search.
#[derive(Debug, Clone, Copy)]
pub struct ScoredMatch<'a> {
    pub entry: &'a CatalogEntry,
    pub score: usize,
    /// Length in characters of the text that was searched.
    pub field_len: usize,
}

/// Count whole-word occurrences of `keyword` in `text`, ignoring case.
pub fn keyword_hits(text: &str, keyword: &str) -> usize {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return 0;
    }
    let text = text.to_lowercase();
    text.match_indices(&keyword)
        .filter(|(start, _)| {
            let before = text[..*start].chars().next_back();
            let after = text[start + keyword.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
        .count()
}

/// Total keyword hits of one entry against `text`.
pub fn score(entry: &CatalogEntry, text: &str) -> usize {
    entry.keywords.iter().map(|k| keyword_hits(text, k)).sum()
}

/// Best entry for `text`, or `None` when the tool has no entries.
pub fn best_entry<'a>(tool: &'a ToolCatalog, text: &str) -> Option<ScoredMatch<'a>> {
    let field_len = text.chars().count();
    let mut best: Option<ScoredMatch<'a>> = None;
    for entry in &tool.entries {
        let hits = score(entry, text);
        if best.is_none_or(|b| hits > b.score) {
            best = Some(ScoredMatch {
                entry,
                score: hits,
                field_len,
            });
        }
    }
    best
}

/// Pick the catalog entry an operation maps to.
pub fn best_match<'a>(tool: &'a ToolCatalog, operation: &Operation) -> Result<&'a CatalogEntry> {
    let no_match = || TranslateError::NoCatalogMatch {
        operation: operation.id.clone(),
    };

    let metadata = &operation.metadata;
    let longname = best_entry(tool, &metadata.longname).ok_or_else(no_match)?;
    let description = best_entry(tool, &metadata.description).ok_or_else(no_match)?;

    let chosen = if longname.score == 0 && description.score == 0 {
        best_entry(tool, &metadata.label).filter(|m| m.score > 0)
    } else if description.score > longname.score
        || (description.score == longname.score && description.field_len > longname.field_len)
    {
        Some(description)
    } else {
        Some(longname)
    };

    let chosen = chosen.ok_or_else(no_match)?;
    debug!(
        operation = %operation.id,
        console_name = %chosen.entry.console_name,
        score = chosen.score,
        "matched catalog entry"
    );
    Ok(chosen.entry)
}
