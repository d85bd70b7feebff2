// Rate lookup tool: filtered, paginated access to the dataset

use super::{
    integer, json_schema_envelope, json_schema_limit, json_schema_object, json_schema_offset,
    json_schema_response_format, json_schema_string, parse_args, validate_limit, validate_offset,
    MAX_LIMIT,
};
use crate::error::ToolError;
use crate::protocol::{ToolAnnotations, ToolSchema};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use traktamente_core::{
    build_params, normalize, Formatter, PageRequest, QueryFilter, Rendered, ResponseFormat,
    TraktamenteClient,
};

pub const NAME: &str = "traktamente_get_rates";
pub const LEGACY_NAME: &str = "get_traktamente";
pub const OPERATION: &str = "Fetching traktamente rates";
pub const DEFAULT_LIMIT: u32 = 100;

const DESCRIPTION: &str = r#"Query Swedish traktamente (per diem) rates from Skatteverket's official database.

This tool retrieves daily travel allowance rates for business trips to different countries. The rates are used by Swedish employers to calculate tax-free per diem payments.

Args:
  - land (string, optional): Country name in Swedish. Supports regex patterns.
  - år (string, optional): Year to filter by (e.g., "2025")
  - landskod (string, optional): ISO country code (e.g., "SE", "NO")
  - normalbelopp (string, optional): Daily rate in SEK. Supports regex.
  - limit (number, optional): Max results (1-500, default: 100)
  - offset (number, optional): Pagination offset (default: 0)
  - response_format ('json' | 'markdown'): Output format (default: 'json')

Returns total, count, offset, limit, results, hasMore and nextOffset (when hasMore).

Examples:
  - Get Sweden's rate: { "landskod": "SE", "år": "2025" }
  - Get Nordic countries: { "land": "Norge|Danmark|Finland", "år": "2025" }
  - Paginate results: { "limit": 20, "offset": 20 }

Note: Country names are in Swedish (e.g., "Tyskland" for Germany, "Frankrike" for France)."#;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetRatesArgs {
    #[serde(default, rename = "land")]
    country: Option<String>,
    #[serde(default, rename = "år")]
    year: Option<String>,
    #[serde(default, rename = "landskod")]
    country_code: Option<String>,
    #[serde(default, rename = "normalbelopp")]
    amount: Option<String>,
    #[serde(default, deserialize_with = "integer")]
    limit: Option<i64>,
    #[serde(default, deserialize_with = "integer")]
    offset: Option<i64>,
    #[serde(default)]
    response_format: ResponseFormat,
}

/// Validated arguments of the rate lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GetRatesRequest {
    pub filter: QueryFilter,
    pub format: ResponseFormat,
}

impl GetRatesRequest {
    pub fn parse(arguments: serde_json::Value) -> Result<Self, ToolError> {
        let args: GetRatesArgs = parse_args(NAME, arguments)?;
        let limit = validate_limit(args.limit, DEFAULT_LIMIT)?;
        let offset = validate_offset(args.offset)?;

        Ok(Self {
            filter: QueryFilter {
                country: args.country,
                amount: args.amount,
                year: args.year,
                country_code: args.country_code,
                limit: Some(limit),
                offset: Some(offset),
            },
            format: args.response_format,
        })
    }
}

pub fn schema() -> ToolSchema {
    ToolSchema {
        name: NAME.to_string(),
        title: Some("Get Traktamente Rates".to_string()),
        description: DESCRIPTION.to_string(),
        input_schema: json_schema_object(
            serde_json::json!({
                "land": json_schema_string("Country or region name in Swedish (e.g., \"Sverige\", \"Norge\", \"Tyskland\"). Supports regex patterns for partial matching."),
                "år": json_schema_string("Year to filter by (e.g., \"2025\", \"2024\")"),
                "landskod": json_schema_string("ISO 3166-1 alpha-2 country code (e.g., \"SE\", \"NO\", \"DE\")"),
                "normalbelopp": json_schema_string("Standard daily allowance amount in SEK. Supports regex for range queries (e.g., \"^3\" for amounts starting with 3)."),
                "limit": json_schema_limit(DEFAULT_LIMIT, MAX_LIMIT),
                "offset": json_schema_offset(),
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
    request: GetRatesRequest,
    cancel: &CancellationToken,
) -> Result<Rendered, ToolError> {
    let page = PageRequest {
        limit: request.filter.limit.map(u64::from),
        offset: request.filter.offset.map(u64::from),
    };

    let raw = client
        .fetch(&build_params(&request.filter), cancel)
        .await
        .map_err(|source| ToolError::Upstream {
            operation: OPERATION,
            source,
        })?;

    let envelope = normalize(raw, page, u64::from(DEFAULT_LIMIT));
    Ok(formatter.render(envelope, request.format)?)
}
