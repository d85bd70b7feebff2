// Country listing tool

use super::{
    integer, json_schema_envelope, json_schema_limit, json_schema_object, json_schema_response_format,
    json_schema_string, parse_args, validate_limit, MAX_LIMIT,
};
use crate::error::ToolError;
use crate::protocol::{ToolAnnotations, ToolSchema};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use traktamente_core::{
    build_params, normalize, Formatter, PageRequest, QueryFilter, Rendered, ResponseFormat,
    TraktamenteClient,
};

pub const NAME: &str = "traktamente_list_countries";
pub const LEGACY_NAME: &str = "get_all_countries";
pub const OPERATION: &str = "Fetching country list";
pub const DEFAULT_LIMIT: u32 = 200;

const DESCRIPTION: &str = r#"List all countries with available traktamente (per diem) rates.

This tool retrieves a comprehensive list of all countries for which Skatteverket has published per diem rates. Use this when you need to see all available countries or when you're unsure of the exact country name.

Args:
  - år (string, optional): Filter by year (e.g., "2025")
  - limit (number, optional): Max results (1-500, default: 200)
  - response_format ('json' | 'markdown'): Output format (default: 'json')

Returns the same structure as traktamente_get_rates.

Examples:
  - List all countries for 2025: { "år": "2025" }
  - Get first 50 countries: { "limit": 50 }

Use traktamente_search for fuzzy matching when you don't know the exact Swedish name."#;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListCountriesArgs {
    #[serde(default, rename = "år")]
    year: Option<String>,
    #[serde(default, deserialize_with = "integer")]
    limit: Option<i64>,
    #[serde(default)]
    response_format: ResponseFormat,
}

/// Validated arguments of the country listing. Always starts at offset 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ListCountriesRequest {
    pub year: Option<String>,
    pub limit: u32,
    pub format: ResponseFormat,
}

impl ListCountriesRequest {
    pub fn parse(arguments: serde_json::Value) -> Result<Self, ToolError> {
        let args: ListCountriesArgs = parse_args(NAME, arguments)?;

        Ok(Self {
            year: args.year,
            limit: validate_limit(args.limit, DEFAULT_LIMIT)?,
            format: args.response_format,
        })
    }

    fn filter(&self) -> QueryFilter {
        QueryFilter {
            year: self.year.clone(),
            limit: Some(self.limit),
            ..Default::default()
        }
    }
}

pub fn schema() -> ToolSchema {
    ToolSchema {
        name: NAME.to_string(),
        title: Some("List All Countries".to_string()),
        description: DESCRIPTION.to_string(),
        input_schema: json_schema_object(
            serde_json::json!({
                "år": json_schema_string("Year to filter by (e.g., \"2025\")"),
                "limit": json_schema_limit(DEFAULT_LIMIT, MAX_LIMIT),
                "response_format": json_schema_response_format()
            }),
            vec![],
        ),
        output_schema: Some(json_schema_envelope()),
        annotations: Some(ToolAnnotations::remote_read_only()),
    }
}

pub(crate) async fn execute(
    client: &TraktamenteClient,
    formatter: &Formatter,
    request: ListCountriesRequest,
    cancel: &CancellationToken,
) -> Result<Rendered, ToolError> {
    let raw = client
        .fetch(&build_params(&request.filter()), cancel)
        .await
        .map_err(|source| ToolError::Upstream {
            operation: OPERATION,
            source,
        })?;

    let page = PageRequest::new(u64::from(request.limit), 0);
    let envelope = normalize(raw, page, u64::from(DEFAULT_LIMIT));
    Ok(formatter.render(envelope, request.format)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{row, toolbox_for, toolbox_with_limit, DATASET_PATH};
    use crate::tools::ToolRequest;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_default_limit_is_200() {
        let request = ListCountriesRequest::parse(serde_json::json!({})).unwrap();
        assert_eq!(request.limit, 200);
        assert_eq!(request.filter().offset, None);
    }

    #[test]
    fn test_offset_is_not_accepted() {
        let result = ListCountriesRequest::parse(serde_json::json!({"offset": 10}));
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }

    #[tokio::test]
    async fn test_lists_countries_for_year() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATASET_PATH))
            .and(query_param("år", "2025"))
            .and(query_param("_limit", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    row("Danmark", "512", "2025", "DK"),
                    row("Finland", "470", "2025", "FI"),
                    row("Norge", "533", "2025", "NO")
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let toolbox = toolbox_for(&server);
        let request = ToolRequest::parse(NAME, serde_json::json!({"år": "2025"})).unwrap();
        let result = toolbox.call(request, &CancellationToken::new()).await.unwrap();

        let structured = result.structured_content.unwrap();
        assert_eq!(structured["count"], 3);
        assert_eq!(structured["total"], 3);
        assert_eq!(structured["limit"], 200);
        assert_eq!(structured["offset"], 0);
        assert_eq!(structured["hasMore"], false);
    }

    #[tokio::test]
    async fn test_large_listing_is_truncated() {
        let server = MockServer::start().await;

        let rows: Vec<_> = (0..40)
            .map(|i| row(&format!("Land {i}"), "500", "2025", "XX"))
            .collect();
        Mock::given(method("GET"))
            .and(path(DATASET_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": rows,
                "total": 40
            })))
            .mount(&server)
            .await;

        let toolbox = toolbox_with_limit(&server, 1_000);
        let request = ToolRequest::parse(NAME, serde_json::json!({})).unwrap();
        let result = toolbox.call(request, &CancellationToken::new()).await.unwrap();

        let structured = result.structured_content.unwrap();
        assert_eq!(structured["truncated"], true);
        assert_eq!(structured["results"].as_array().unwrap().len(), 20);
        assert_eq!(structured["nextOffset"], 20);
    }
}
