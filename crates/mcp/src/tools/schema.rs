// Helper functions for creating tool schemas

use traktamente_core::{FIELD_AMOUNT, FIELD_COUNTRY, FIELD_COUNTRY_CODE, FIELD_YEAR};

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_array(items: serde_json::Value, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

/// Integer page size in `[1, max]` with a per-tool default.
pub fn json_schema_limit(default: u32, max: u32) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "minimum": 1,
        "maximum": max,
        "default": default,
        "description": format!("Maximum number of results to return (1-{}, default: {})", max, default)
    })
}

pub fn json_schema_offset() -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "minimum": 0,
        "default": 0,
        "description": "Number of results to skip for pagination (default: 0)"
    })
}

pub fn json_schema_response_format() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "enum": ["json", "markdown"],
        "default": "json",
        "description": "Output format: 'json' for structured data (default), 'markdown' for human-readable text"
    })
}

/// Schema of one dataset row, using the upstream column names.
pub fn json_schema_row() -> serde_json::Value {
    let scalar = serde_json::json!({ "type": ["string", "number"] });
    serde_json::json!({
        "type": "object",
        "properties": {
            FIELD_COUNTRY: json_schema_string("Country or region name (Swedish)"),
            FIELD_AMOUNT: scalar.clone(),
            FIELD_YEAR: scalar,
            FIELD_COUNTRY_CODE: json_schema_string("Country code")
        },
        "required": [FIELD_COUNTRY, FIELD_AMOUNT, FIELD_YEAR, FIELD_COUNTRY_CODE]
    })
}

/// Output schema shared by the paginated listing tools.
pub fn json_schema_envelope() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "total": json_schema_number("Total number of matching results"),
            "count": json_schema_number("Number of results in this response"),
            "offset": json_schema_number("Current pagination offset"),
            "limit": json_schema_number("Maximum results per page"),
            "results": json_schema_array(json_schema_row(), "Matching traktamente records"),
            "hasMore": json_schema_boolean("Whether more results are available"),
            "nextOffset": json_schema_number("Offset value for the next page (if hasMore is true)"),
            "truncated": json_schema_boolean("Present when the response was cut to fit the size limit"),
            "truncationMessage": json_schema_string("Explains how the response was truncated")
        },
        "required": ["total", "count", "offset", "limit", "results", "hasMore"]
    })
}
