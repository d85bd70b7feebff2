// Core types and functionality for the traktamente MCP adapter

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod pagination;
pub mod query;
pub mod types;

pub use client::TraktamenteClient;
pub use config::{OutputConfig, RetryConfig, Settings, UpstreamConfig};
pub use error::{UpstreamError, UpstreamResult};
pub use format::{Formatter, Listing, Rendered, ResponseFormat, Truncated};
pub use pagination::{normalize, PageRequest, PaginationEnvelope, SearchResult};
pub use query::{build_params, QueryParams};
pub use types::*;
