// Traktamente tools exposed over MCP

pub mod countries;
pub mod rates;
pub mod search;
mod schema;

pub use countries::ListCountriesRequest;
pub use rates::GetRatesRequest;
pub use schema::{
    json_schema_array, json_schema_boolean, json_schema_envelope, json_schema_limit,
    json_schema_number, json_schema_object, json_schema_offset, json_schema_response_format,
    json_schema_row, json_schema_string,
};
pub use search::SearchRequest;

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolSchema};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use traktamente_core::{Formatter, Rendered, Settings, TraktamenteClient, UpstreamResult};

/// Largest page size the dataset accepts.
pub const MAX_LIMIT: u32 = 500;

/// The closed set of tools this server offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    GetRates,
    ListCountries,
    Search,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [Self::GetRates, Self::ListCountries, Self::Search];

    pub fn name(self) -> &'static str {
        match self {
            Self::GetRates => rates::NAME,
            Self::ListCountries => countries::NAME,
            Self::Search => search::NAME,
        }
    }

    /// Resolve a tool name, accepting the names used by earlier releases.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| {
            kind.name() == name
                || match kind {
                    Self::GetRates => name == rates::LEGACY_NAME,
                    Self::ListCountries => name == countries::LEGACY_NAME,
                    Self::Search => name == search::LEGACY_NAME,
                }
        })
    }

    /// Human-readable operation name used in error messages.
    pub fn operation(self) -> &'static str {
        match self {
            Self::GetRates => rates::OPERATION,
            Self::ListCountries => countries::OPERATION,
            Self::Search => search::OPERATION,
        }
    }

    pub fn schema(self) -> ToolSchema {
        match self {
            Self::GetRates => rates::schema(),
            Self::ListCountries => countries::schema(),
            Self::Search => search::schema(),
        }
    }
}

/// A validated tool call, one variant per tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    GetRates(GetRatesRequest),
    ListCountries(ListCountriesRequest),
    Search(SearchRequest),
}

impl ToolRequest {
    /// Parse and validate a `tools/call` name and argument object.
    pub fn parse(name: &str, arguments: serde_json::Value) -> Result<Self, ToolError> {
        let kind =
            ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let arguments = if arguments.is_null() {
            serde_json::json!({})
        } else {
            arguments
        };

        match kind {
            ToolKind::GetRates => Ok(Self::GetRates(GetRatesRequest::parse(arguments)?)),
            ToolKind::ListCountries => {
                Ok(Self::ListCountries(ListCountriesRequest::parse(arguments)?))
            }
            ToolKind::Search => Ok(Self::Search(SearchRequest::parse(arguments)?)),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::GetRates(_) => ToolKind::GetRates,
            Self::ListCountries(_) => ToolKind::ListCountries,
            Self::Search(_) => ToolKind::Search,
        }
    }
}

/// Everything a tool call needs: the dataset client and the output formatter.
#[derive(Debug, Clone)]
pub struct Toolbox {
    client: TraktamenteClient,
    formatter: Formatter,
}

impl Toolbox {
    pub fn new(client: TraktamenteClient, formatter: Formatter) -> Self {
        Self { client, formatter }
    }

    /// Build a toolbox from process settings.
    pub fn from_settings(settings: &Settings) -> UpstreamResult<Self> {
        let client = TraktamenteClient::new(Arc::new(settings.upstream.clone()))?;
        Ok(Self::new(
            client,
            Formatter::new(settings.output.character_limit),
        ))
    }

    /// List all tool schemas
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        ToolKind::ALL.into_iter().map(ToolKind::schema).collect()
    }

    /// Execute a validated tool call.
    pub async fn call(
        &self,
        request: ToolRequest,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, ToolError> {
        let rendered: Rendered = match request {
            ToolRequest::GetRates(request) => {
                rates::execute(&self.client, &self.formatter, request, cancel).await?
            }
            ToolRequest::ListCountries(request) => {
                countries::execute(&self.client, &self.formatter, request, cancel).await?
            }
            ToolRequest::Search(request) => {
                search::execute(&self.client, &self.formatter, request, cancel).await?
            }
        };

        Ok(CallToolResult::success(rendered.text, rendered.structured))
    }
}

/// Deserialize strict tool arguments, reporting failures as validation errors.
pub(crate) fn parse_args<T: DeserializeOwned>(
    tool: &str,
    arguments: serde_json::Value,
) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::Validation(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Read an optional integer argument, accepting whole numbers written as
/// floats (`10.0`). Fractions are rejected.
pub(crate) fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Some(value) = number.as_i64() {
        return Ok(Some(value));
    }

    match number.as_f64() {
        Some(value)
            if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 =>
        {
            Ok(Some(value as i64))
        }
        _ => Err(D::Error::custom(format!("expected an integer, got {}", number))),
    }
}

/// Resolve a page size against a per-tool default and the `[1, MAX_LIMIT]` range.
pub(crate) fn validate_limit(limit: Option<i64>, default: u32) -> Result<u32, ToolError> {
    match limit {
        None => Ok(default),
        Some(limit) if (1..=i64::from(MAX_LIMIT)).contains(&limit) => Ok(limit as u32),
        Some(limit) => Err(ToolError::Validation(format!(
            "limit must be between 1 and {} (got {})",
            MAX_LIMIT, limit
        ))),
    }
}

pub(crate) fn validate_offset(offset: Option<i64>) -> Result<u32, ToolError> {
    match offset {
        None => Ok(0),
        Some(offset) if (0..=i64::from(u32::MAX)).contains(&offset) => Ok(offset as u32),
        Some(offset) => Err(ToolError::Validation(format!(
            "offset must be a non-negative integer (got {})",
            offset
        ))),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use traktamente_core::{RetryConfig, UpstreamConfig};
    use wiremock::MockServer;

    pub const DATASET_PATH: &str = "/rowstore/dataset/test";

    pub fn toolbox_for(server: &MockServer) -> Toolbox {
        toolbox_with_limit(server, traktamente_core::config::DEFAULT_CHARACTER_LIMIT)
    }

    pub fn toolbox_with_limit(server: &MockServer, character_limit: usize) -> Toolbox {
        let config = UpstreamConfig {
            url: format!("{}{}", server.uri(), DATASET_PATH),
            timeout_ms: 2_000,
            user_agent: "traktamente-test/1.0".to_string(),
            retry: RetryConfig {
                backoff_step_ms: 10,
                ..Default::default()
            },
        };
        let client = TraktamenteClient::new(Arc::new(config)).unwrap();
        Toolbox::new(client, Formatter::new(character_limit))
    }

    pub fn row(country: &str, amount: &str, year: &str, code: &str) -> serde_json::Value {
        serde_json::json!({
            "land eller område": country,
            "normalbelopp": amount,
            "år": year,
            "landskod": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_and_aliases() {
        assert_eq!(ToolKind::from_name("traktamente_get_rates"), Some(ToolKind::GetRates));
        assert_eq!(ToolKind::from_name("get_traktamente"), Some(ToolKind::GetRates));
        assert_eq!(
            ToolKind::from_name("traktamente_list_countries"),
            Some(ToolKind::ListCountries)
        );
        assert_eq!(ToolKind::from_name("get_all_countries"), Some(ToolKind::ListCountries));
        assert_eq!(ToolKind::from_name("traktamente_search"), Some(ToolKind::Search));
        assert_eq!(ToolKind::from_name("search_traktamente"), Some(ToolKind::Search));
        assert_eq!(ToolKind::from_name("delete_everything"), None);
    }

    #[test]
    fn test_unknown_tool_is_typed_error() {
        let result = ToolRequest::parse("nope", serde_json::json!({}));
        assert!(matches!(result, Err(ToolError::UnknownTool(name)) if name == "nope"));
    }

    #[test]
    fn test_null_arguments_treated_as_empty() {
        let request = ToolRequest::parse("traktamente_get_rates", serde_json::Value::Null).unwrap();
        assert_eq!(request.kind(), ToolKind::GetRates);
    }

    #[test]
    fn test_validate_limit() {
        assert_eq!(validate_limit(None, 100).unwrap(), 100);
        assert_eq!(validate_limit(Some(1), 100).unwrap(), 1);
        assert_eq!(validate_limit(Some(500), 100).unwrap(), 500);
        assert!(validate_limit(Some(0), 100).is_err());
        assert!(validate_limit(Some(501), 100).is_err());
        assert!(validate_limit(Some(-3), 100).is_err());
    }

    #[test]
    fn test_whole_floats_accepted_as_integers() {
        let request = ToolRequest::parse(
            "traktamente_get_rates",
            serde_json::json!({"limit": 10.0, "offset": 20.0}),
        )
        .unwrap();
        match request {
            ToolRequest::GetRates(request) => {
                assert_eq!(request.filter.limit, Some(10));
                assert_eq!(request.filter.offset, Some(20));
            }
            other => panic!("unexpected request: {:?}", other),
        }

        let request =
            ToolRequest::parse("traktamente_search", serde_json::json!({"search": "Nor", "limit": 5.0}))
                .unwrap();
        assert!(matches!(request, ToolRequest::Search(SearchRequest { limit: 5, .. })));

        let request =
            ToolRequest::parse("traktamente_list_countries", serde_json::json!({"limit": null})).unwrap();
        assert!(matches!(request, ToolRequest::ListCountries(ListCountriesRequest { limit: 200, .. })));
    }

    #[test]
    fn test_fractional_numbers_rejected() {
        for arguments in [
            serde_json::json!({"limit": 10.5}),
            serde_json::json!({"offset": 0.25}),
            serde_json::json!({"limit": "10"}),
        ] {
            assert!(matches!(
                ToolRequest::parse("traktamente_get_rates", arguments),
                Err(ToolError::Validation(_))
            ));
        }
        assert!(matches!(
            ToolRequest::parse("traktamente_get_rates", serde_json::json!({"limit": 1e30})),
            Err(ToolError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_offset() {
        assert_eq!(validate_offset(None).unwrap(), 0);
        assert_eq!(validate_offset(Some(40)).unwrap(), 40);
        assert!(validate_offset(Some(-1)).is_err());
    }

    #[test]
    fn test_every_schema_is_annotated() {
        for kind in ToolKind::ALL {
            let schema = kind.schema();
            assert_eq!(schema.name, kind.name());
            assert!(schema.title.is_some());
            assert!(schema.output_schema.is_some());
            let annotations = schema.annotations.unwrap();
            assert!(annotations.read_only_hint);
            assert!(!annotations.destructive_hint);
        }
    }
}
