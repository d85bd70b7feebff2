//! Rendering of listings as JSON or Markdown, with a size guard.

use crate::pagination::{PaginationEnvelope, SearchResult};
use crate::types::TraktamenteRow;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Output format requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    Markdown,
}

/// A rendered tool response: display text plus the matching structured value.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub structured: serde_json::Value,
    pub truncated: bool,
}

/// A listing the formatter can render and shrink.
pub trait Listing: Serialize {
    fn rows(&self) -> &[TraktamenteRow];

    /// Drop every row past `keep`, keeping derived counters consistent.
    fn retain_first(&mut self, keep: usize);

    fn to_markdown(&self) -> String;
}

impl Listing for PaginationEnvelope {
    fn rows(&self) -> &[TraktamenteRow] {
        &self.results
    }

    fn retain_first(&mut self, keep: usize) {
        PaginationEnvelope::retain_first(self, keep);
    }

    fn to_markdown(&self) -> String {
        let mut out = String::from("# Traktamente Rates\n\n");
        let _ = writeln!(
            out,
            "Found {} result(s), showing {} (offset: {})\n",
            self.total, self.count, self.offset
        );
        push_rows(&mut out, &self.results);

        if let Some(next_offset) = self.next_offset {
            let _ = writeln!(
                out,
                "*More results available. Use offset={} to see the next page.*",
                next_offset
            );
        }
        out
    }
}

impl Listing for SearchResult {
    fn rows(&self) -> &[TraktamenteRow] {
        &self.results
    }

    fn retain_first(&mut self, keep: usize) {
        SearchResult::retain_first(self, keep);
    }

    fn to_markdown(&self) -> String {
        let mut out = format!("# Search Results for \"{}\"\n\n", self.search_term);
        let _ = writeln!(out, "Found {} result(s)\n", self.count);
        push_rows(&mut out, &self.results);
        out
    }
}

fn push_rows(out: &mut String, rows: &[TraktamenteRow]) {
    for row in rows {
        let _ = writeln!(out, "### {} ({})", row.country, row.country_code);
        let _ = writeln!(out, "- **Normalbelopp**: {} SEK", row.amount);
        let _ = writeln!(out, "- **År**: {}\n", row.year);
    }
}

/// A listing that was cut down to fit the character budget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Truncated<T> {
    #[serde(flatten)]
    pub listing: T,
    pub truncated: bool,
    pub truncation_message: String,
}

/// Renders listings within a fixed character budget.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    character_limit: usize,
}

impl Formatter {
    pub fn new(character_limit: usize) -> Self {
        Self { character_limit }
    }

    pub fn character_limit(&self) -> usize {
        self.character_limit
    }

    /// Render a listing, halving it once if the text exceeds the budget.
    ///
    /// The halving is applied a single time. If the shrunken output is still
    /// over budget it is returned as-is and a warning is logged.
    pub fn render<T: Listing>(
        &self,
        mut listing: T,
        format: ResponseFormat,
    ) -> Result<Rendered, serde_json::Error> {
        let text = render_text(&listing, format)?;
        if text.chars().count() <= self.character_limit {
            return Ok(Rendered {
                structured: serde_json::to_value(&listing)?,
                text,
                truncated: false,
            });
        }

        let original = listing.rows().len();
        let keep = (original / 2).max(1);
        listing.retain_first(keep);

        tracing::debug!(original, keep, "Response over character limit, truncating");

        let truncated = Truncated {
            listing,
            truncated: true,
            truncation_message: format!(
                "Response truncated from {} to {} results. Use the offset and limit parameters or add filters to see more results.",
                original, keep
            ),
        };

        let text = match format {
            ResponseFormat::Json => serde_json::to_string_pretty(&truncated)?,
            ResponseFormat::Markdown => format!(
                "{}\n> {}\n",
                truncated.listing.to_markdown(),
                truncated.truncation_message
            ),
        };

        let length = text.chars().count();
        if length > self.character_limit {
            tracing::warn!(
                length,
                limit = self.character_limit,
                "Truncated response still exceeds character limit"
            );
        }

        Ok(Rendered {
            structured: serde_json::to_value(&truncated)?,
            text,
            truncated: true,
        })
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CHARACTER_LIMIT)
    }
}

fn render_text<T: Listing>(listing: &T, format: ResponseFormat) -> Result<String, serde_json::Error> {
    match format {
        ResponseFormat::Json => serde_json::to_string_pretty(listing),
        ResponseFormat::Markdown => Ok(listing.to_markdown()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{normalize, PageRequest, DEFAULT_LIMIT};
    use crate::types::UpstreamResponse;

    fn envelope(n: usize, total: Option<u64>) -> PaginationEnvelope {
        let results = (0..n)
            .map(|i| TraktamenteRow::new(format!("Land nummer {i}"), "512", "2025", "XX"))
            .collect();
        normalize(
            UpstreamResponse {
                results,
                offset: Some(0),
                limit: Some(500),
                total,
            },
            PageRequest::default(),
            DEFAULT_LIMIT,
        )
    }

    #[test]
    fn test_response_format_parsing() {
        let format: ResponseFormat = serde_json::from_str(r#""markdown""#).unwrap();
        assert_eq!(format, ResponseFormat::Markdown);
        assert_eq!(ResponseFormat::default(), ResponseFormat::Json);
        assert!(serde_json::from_str::<ResponseFormat>(r#""xml""#).is_err());
    }

    #[test]
    fn test_json_render_is_pretty_envelope() {
        let env = envelope(2, Some(2));
        let rendered = Formatter::default().render(env.clone(), ResponseFormat::Json).unwrap();

        assert!(!rendered.truncated);
        assert!(rendered.text.contains("\n  \"total\": 2"));
        assert_eq!(rendered.structured, serde_json::to_value(&env).unwrap());
    }

    #[test]
    fn test_markdown_render_envelope() {
        let mut env = envelope(1, Some(3));
        env.results[0] = TraktamenteRow::new("Frankrike", "687", "2025", "FR");

        let rendered = Formatter::default().render(env, ResponseFormat::Markdown).unwrap();
        assert!(rendered.text.starts_with("# Traktamente Rates"));
        assert!(rendered.text.contains("Found 3 result(s), showing 1 (offset: 0)"));
        assert!(rendered.text.contains("### Frankrike (FR)"));
        assert!(rendered.text.contains("- **Normalbelopp**: 687 SEK"));
        assert!(rendered.text.contains("- **År**: 2025"));
        assert!(rendered.text.contains("Use offset=1 to see the next page"));
    }

    #[test]
    fn test_markdown_without_more_has_no_trailer() {
        let rendered = Formatter::default()
            .render(envelope(1, Some(1)), ResponseFormat::Markdown)
            .unwrap();
        assert!(!rendered.text.contains("More results available"));
    }

    #[test]
    fn test_markdown_render_search() {
        let result = SearchResult::new(
            "Frank",
            vec![TraktamenteRow::new("Frankrike", "687", "2025", "FR")],
        );

        let rendered = Formatter::default().render(result, ResponseFormat::Markdown).unwrap();
        assert!(rendered.text.starts_with("# Search Results for \"Frank\""));
        assert!(rendered.text.contains("Found 1 result(s)"));
        assert!(rendered.text.contains("### Frankrike (FR)"));
    }

    #[test]
    fn test_oversized_json_is_halved_once() {
        let env = envelope(400, Some(400));
        let formatter = Formatter::default();
        assert!(serde_json::to_string_pretty(&env).unwrap().len() > formatter.character_limit());

        let rendered = formatter.render(env, ResponseFormat::Json).unwrap();
        assert!(rendered.truncated);
        assert_eq!(rendered.structured["results"].as_array().unwrap().len(), 200);
        assert_eq!(rendered.structured["truncated"], true);
        assert_eq!(rendered.structured["count"], 200);
        assert_eq!(rendered.structured["hasMore"], true);
        assert_eq!(rendered.structured["nextOffset"], 200);
        assert!(rendered.structured["truncationMessage"]
            .as_str()
            .unwrap()
            .contains("from 400 to 200"));
        assert!(rendered.text.contains("\"truncated\": true"));
    }

    #[test]
    fn test_oversized_markdown_is_halved() {
        let rendered = Formatter::new(500)
            .render(envelope(20, Some(20)), ResponseFormat::Markdown)
            .unwrap();

        assert!(rendered.truncated);
        assert_eq!(rendered.text.matches("### ").count(), 10);
        assert!(rendered.text.contains("Response truncated from 20 to 10 results"));
    }

    #[test]
    fn test_single_row_never_truncated_to_zero() {
        let rendered = Formatter::new(10)
            .render(envelope(1, Some(1)), ResponseFormat::Json)
            .unwrap();

        assert!(rendered.truncated);
        assert_eq!(rendered.structured["results"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_odd_length_rounds_down() {
        let rendered = Formatter::new(100)
            .render(
                SearchResult::new("a", envelope(7, None).results),
                ResponseFormat::Json,
            )
            .unwrap();

        assert_eq!(rendered.structured["count"], 3);
        assert_eq!(rendered.structured["searchTerm"], "a");
    }
}
