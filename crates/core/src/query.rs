// Mapping from filter fields to rowstore query-string parameters

use crate::types::{QueryFilter, FIELD_AMOUNT, FIELD_COUNTRY, FIELD_COUNTRY_CODE, FIELD_YEAR};

/// Rowstore parameter for the page size.
pub const PARAM_LIMIT: &str = "_limit";
/// Rowstore parameter for the page offset.
pub const PARAM_OFFSET: &str = "_offset";

/// Ordered query-string pairs, ready for URL encoding.
pub type QueryParams = Vec<(&'static str, String)>;

/// Build the upstream query for a filter.
///
/// Only `None` is dropped. An empty string is forwarded as-is so callers can
/// match empty cells deliberately.
pub fn build_params(filter: &QueryFilter) -> QueryParams {
    let mut params = QueryParams::new();

    push_text(&mut params, FIELD_COUNTRY, filter.country.as_deref());
    push_text(&mut params, FIELD_AMOUNT, filter.amount.as_deref());
    push_text(&mut params, FIELD_YEAR, filter.year.as_deref());
    push_text(&mut params, FIELD_COUNTRY_CODE, filter.country_code.as_deref());

    if let Some(limit) = filter.limit {
        params.push((PARAM_LIMIT, limit.to_string()));
    }
    if let Some(offset) = filter.offset {
        params.push((PARAM_OFFSET, offset.to_string()));
    }

    params
}

fn push_text(params: &mut QueryParams, key: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_empty_filter_builds_no_params() {
        assert!(build_params(&QueryFilter::default()).is_empty());
    }

    #[test]
    fn test_all_fields_mapped_to_upstream_keys() {
        let filter = QueryFilter {
            country: Some("Norge".to_string()),
            amount: Some("^3".to_string()),
            year: Some("2025".to_string()),
            country_code: Some("NO".to_string()),
            limit: Some(10),
            offset: Some(20),
        };

        let params = build_params(&filter);
        assert_eq!(params.len(), 6);
        assert_eq!(lookup(&params, "land eller område"), Some("Norge"));
        assert_eq!(lookup(&params, "normalbelopp"), Some("^3"));
        assert_eq!(lookup(&params, "år"), Some("2025"));
        assert_eq!(lookup(&params, "landskod"), Some("NO"));
        assert_eq!(lookup(&params, "_limit"), Some("10"));
        assert_eq!(lookup(&params, "_offset"), Some("20"));
    }

    #[test]
    fn test_absent_fields_are_dropped() {
        let filter = QueryFilter {
            year: Some("2024".to_string()),
            limit: Some(200),
            ..Default::default()
        };

        let params = build_params(&filter);
        assert_eq!(
            params,
            vec![("år", "2024".to_string()), ("_limit", "200".to_string())]
        );
        assert!(params.iter().all(|(_, v)| v != "null" && v != "undefined"));
    }

    #[test]
    fn test_empty_string_is_forwarded() {
        let filter = QueryFilter {
            country: Some(String::new()),
            ..Default::default()
        };

        let params = build_params(&filter);
        assert_eq!(lookup(&params, "land eller område"), Some(""));
    }

    #[test]
    fn test_zero_offset_is_forwarded() {
        let filter = QueryFilter {
            offset: Some(0),
            ..Default::default()
        };

        assert_eq!(lookup(&build_params(&filter), "_offset"), Some("0"));
    }

    #[test]
    fn test_accented_values_unchanged() {
        let filter = QueryFilter {
            country: Some("Österrike".to_string()),
            ..Default::default()
        };

        assert_eq!(
            lookup(&build_params(&filter), "land eller område"),
            Some("Österrike")
        );
    }
}
