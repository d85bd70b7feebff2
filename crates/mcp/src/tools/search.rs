// Free-text country search tool

use super::{
    integer, json_schema_array, json_schema_limit, json_schema_number, json_schema_object,
    json_schema_response_format, json_schema_row, json_schema_string, parse_args, validate_limit,
    MAX_LIMIT,
};
use crate::error::ToolError;
use crate::protocol::{ToolAnnotations, ToolSchema};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use traktamente_core::{
    build_params, Formatter, QueryFilter, Rendered, ResponseFormat, SearchResult,
    TraktamenteClient,
};

pub const NAME: &str = "traktamente_search";
pub const LEGACY_NAME: &str = "search_traktamente";
pub const OPERATION: &str = "Searching traktamente";
pub const DEFAULT_LIMIT: u32 = 50;

const DESCRIPTION: &str = r#"Search for traktamente rates by country name using pattern matching.

This tool is ideal when you don't know the exact Swedish spelling of a country name. It supports regex patterns for flexible searching.

Args:
  - search (string, required): Search term or regex pattern
  - år (string, optional): Filter by year (e.g., "2025")
  - limit (number, optional): Max results (1-500, default: 50)
  - response_format ('json' | 'markdown'): Output format (default: 'json')

Returns searchTerm, count and the matching results.

Examples:
  - Find France: { "search": "Frank" } finds "Frankrike"
  - Find Germany: { "search": "Tysk" } finds "Tyskland"
  - Countries starting with S: { "search": "^S" }
  - Case-insensitive: { "search": "[Ss]pan" } finds "Spanien"

Tip: Swedish country names often differ from English (Tyskland=Germany, Frankrike=France, Spanien=Spain, Schweiz=Switzerland)."#;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArgs {
    search: String,
    #[serde(default, rename = "år")]
    year: Option<String>,
    #[serde(default, deserialize_with = "integer")]
    limit: Option<i64>,
    #[serde(default)]
    response_format: ResponseFormat,
}

/// Validated arguments of the country search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub search: String,
    pub year: Option<String>,
    pub limit: u32,
    pub format: ResponseFormat,
}

impl SearchRequest {
    pub fn parse(arguments: serde_json::Value) -> Result<Self, ToolError> {
        let args: SearchArgs = parse_args(NAME, arguments)?;
        if args.search.is_empty() {
            return Err(ToolError::Validation("Search term is required".to_string()));
        }

        Ok(Self {
            search: args.search,
            year: args.year,
            limit: validate_limit(args.limit, DEFAULT_LIMIT)?,
            format: args.response_format,
        })
    }

    fn filter(&self) -> QueryFilter {
        QueryFilter {
            country: Some(self.search.clone()),
            year: self.year.clone(),
            limit: Some(self.limit),
            ..Default::default()
        }
    }
}

pub fn schema() -> ToolSchema {
    ToolSchema {
        name: NAME.to_string(),
        title: Some("Search Traktamente".to_string()),
        description: DESCRIPTION.to_string(),
        input_schema: json_schema_object(
            serde_json::json!({
                "search": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Search term or regex pattern for country names (e.g., \"Frank\" to find France/Frankrike, \"^S\" for countries starting with S)"
                },
                "år": json_schema_string("Year to filter by (e.g., \"2025\")"),
                "limit": json_schema_limit(DEFAULT_LIMIT, MAX_LIMIT),
                "response_format": json_schema_response_format()
            }),
            vec!["search"],
        ),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "searchTerm": json_schema_string("The search pattern used"),
                "count": json_schema_number("Number of matches"),
                "results": json_schema_array(json_schema_row(), "Matching traktamente records")
            },
            "required": ["searchTerm", "count", "results"]
        })),
        annotations: Some(ToolAnnotations::remote_read_only()),
    }
}

pub(crate) async fn execute(
    client: &TraktamenteClient,
    formatter: &Formatter,
    request: SearchRequest,
    cancel: &CancellationToken,
) -> Result<Rendered, ToolError> {
    let raw = client
        .fetch(&build_params(&request.filter()), cancel)
        .await
        .map_err(|source| ToolError::Upstream {
            operation: OPERATION,
            source,
        })?;

    let result = SearchResult::new(request.search, raw.results);
    Ok(formatter.render(result, request.format)?)
}
