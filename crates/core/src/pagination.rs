// Normalization of rowstore pages into a stable pagination envelope

use crate::types::{TraktamenteRow, UpstreamResponse};
use serde::{Deserialize, Serialize};

/// Page size used when neither upstream nor the caller names one.
pub const DEFAULT_LIMIT: u64 = 100;

/// Paging values the caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PageRequest {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }
}

/// Normalized page of rows returned by listing operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationEnvelope {
    pub total: u64,
    pub count: u64,
    pub offset: u64,
    pub limit: u64,
    pub results: Vec<TraktamenteRow>,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
}

impl PaginationEnvelope {
    /// Keep only the first `keep` rows and recompute the paging fields.
    ///
    /// `total` is left alone, so `nextOffset` keeps pointing at the first
    /// dropped row.
    pub fn retain_first(&mut self, keep: usize) {
        self.results.truncate(keep);
        self.count = self.results.len() as u64;
        let end = self.offset.saturating_add(self.count);
        self.has_more = end < self.total;
        self.next_offset = self.has_more.then_some(end);
    }
}

/// Shape a raw upstream page into a [`PaginationEnvelope`].
///
/// Precedence for `limit` and `offset` is upstream, then caller, then
/// defaults. Without an upstream `total` this runs in a degraded mode:
/// `total` becomes the page size and `hasMore` is inferred from a full page,
/// which cannot tell an exhausted dataset from an upstream that capped the
/// page below the requested limit.
pub fn normalize(
    raw: UpstreamResponse,
    requested: PageRequest,
    default_limit: u64,
) -> PaginationEnvelope {
    let count = raw.results.len() as u64;
    let limit = raw.limit.or(requested.limit).unwrap_or(default_limit);
    let offset = raw.offset.or(requested.offset).unwrap_or(0);

    let end = offset.saturating_add(count);
    let (total, has_more) = match raw.total {
        Some(total) => (total, end < total),
        None => (count, count == limit),
    };

    PaginationEnvelope {
        total,
        count,
        offset,
        limit,
        results: raw.results,
        has_more,
        next_offset: has_more.then_some(end),
    }
}

/// Result of a free-text country search. Not paginated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub search_term: String,
    pub count: u64,
    pub results: Vec<TraktamenteRow>,
}

impl SearchResult {
    pub fn new(search_term: impl Into<String>, results: Vec<TraktamenteRow>) -> Self {
        Self {
            search_term: search_term.into(),
            count: results.len() as u64,
            results,
        }
    }

    pub fn retain_first(&mut self, keep: usize) {
        self.results.truncate(keep);
        self.count = self.results.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<TraktamenteRow> {
        (0..n)
            .map(|i| TraktamenteRow::new(format!("Land {i}"), "500", "2025", "XX"))
            .collect()
    }

    fn page(n: usize, offset: Option<u64>, limit: Option<u64>, total: Option<u64>) -> UpstreamResponse {
        UpstreamResponse {
            results: rows(n),
            offset,
            limit,
            total,
        }
    }

    #[test]
    fn test_total_known_with_more_pages() {
        let env = normalize(page(10, Some(20), Some(10), Some(45)), PageRequest::default(), DEFAULT_LIMIT);

        assert_eq!(env.count, 10);
        assert_eq!(env.total, 45);
        assert!(env.has_more);
        assert_eq!(env.next_offset, Some(30));
    }

    #[test]
    fn test_total_known_last_page() {
        let env = normalize(page(5, Some(40), Some(10), Some(45)), PageRequest::default(), DEFAULT_LIMIT);

        assert!(!env.has_more);
        assert_eq!(env.next_offset, None);
    }

    #[test]
    fn test_total_absent_full_page_infers_more() {
        let env = normalize(page(3, None, None, None), PageRequest::new(3, 0), DEFAULT_LIMIT);

        assert_eq!(env.total, 3);
        assert_eq!(env.limit, 3);
        assert!(env.has_more);
        assert_eq!(env.next_offset, Some(3));
    }

    #[test]
    fn test_total_absent_short_page_is_exhausted() {
        let env = normalize(page(2, None, None, None), PageRequest::new(3, 6), DEFAULT_LIMIT);

        assert_eq!(env.offset, 6);
        assert!(!env.has_more);
        assert_eq!(env.next_offset, None);
    }

    #[test]
    fn test_upstream_values_take_precedence() {
        let env = normalize(page(1, Some(7), Some(25), Some(100)), PageRequest::new(50, 3), DEFAULT_LIMIT);

        assert_eq!(env.limit, 25);
        assert_eq!(env.offset, 7);
    }

    #[test]
    fn test_defaults_when_unspecified() {
        let env = normalize(page(0, None, None, None), PageRequest::default(), DEFAULT_LIMIT);

        assert_eq!(env.limit, 100);
        assert_eq!(env.offset, 0);
        assert_eq!(env.count, 0);
        assert!(!env.has_more);

        let env = normalize(page(0, None, None, None), PageRequest::default(), 200);
        assert_eq!(env.limit, 200);
    }

    #[test]
    fn test_empty_page_never_has_more() {
        let env = normalize(page(0, Some(0), Some(50), None), PageRequest::default(), DEFAULT_LIMIT);

        assert!(!env.has_more);
        assert!(env.next_offset.is_none());
    }

    #[test]
    fn test_next_offset_invariant_over_grid() {
        for total in [None, Some(0), Some(5), Some(12), Some(100)] {
            for count in [0usize, 1, 5] {
                for offset in [0u64, 5, 10] {
                    let env = normalize(
                        page(count, Some(offset), Some(5), total),
                        PageRequest::default(),
                        DEFAULT_LIMIT,
                    );

                    let expected = match total {
                        Some(t) => offset + (count as u64) < t,
                        None => count as u64 == 5,
                    };
                    assert_eq!(env.has_more, expected);
                    assert_eq!(env.next_offset.is_some(), env.has_more);
                    if let Some(next) = env.next_offset {
                        assert_eq!(next, env.offset + env.count);
                    }
                }
            }
        }
    }

    #[test]
    fn test_huge_upstream_offset_does_not_overflow() {
        let env = normalize(page(3, Some(u64::MAX - 1), Some(3), Some(u64::MAX)), PageRequest::default(), DEFAULT_LIMIT);
        assert!(!env.has_more);
        assert_eq!(env.next_offset, None);

        let mut env = normalize(page(3, Some(u64::MAX), Some(3), None), PageRequest::default(), DEFAULT_LIMIT);
        assert!(env.has_more);
        assert_eq!(env.next_offset, Some(u64::MAX));

        env.retain_first(1);
        assert_eq!(env.count, 1);
        assert!(!env.has_more);
    }

    #[test]
    fn test_envelope_serializes_camel_case() {
        let env = normalize(page(1, Some(0), Some(1), Some(2)), PageRequest::default(), DEFAULT_LIMIT);
        let value = serde_json::to_value(&env).unwrap();

        assert_eq!(value["hasMore"], true);
        assert_eq!(value["nextOffset"], 1);

        let env = normalize(page(1, Some(0), Some(1), Some(1)), PageRequest::default(), DEFAULT_LIMIT);
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["hasMore"], false);
        assert!(value.get("nextOffset").is_none());
    }

    #[test]
    fn test_retain_first_recomputes_paging() {
        let mut env = normalize(page(10, Some(0), Some(10), Some(10)), PageRequest::default(), DEFAULT_LIMIT);
        assert!(!env.has_more);

        env.retain_first(5);
        assert_eq!(env.count, 5);
        assert_eq!(env.total, 10);
        assert!(env.has_more);
        assert_eq!(env.next_offset, Some(5));
    }

    #[test]
    fn test_search_result_counts_rows() {
        let mut result = SearchResult::new("Frank", rows(4));
        assert_eq!(result.count, 4);

        result.retain_first(2);
        assert_eq!(result.count, 2);
        assert_eq!(result.results.len(), 2);
    }
}
