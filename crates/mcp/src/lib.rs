// MCP (Model Context Protocol) server for the Skatteverket traktamente dataset
// Exposes rate lookup, country listing and search as MCP tools

pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::ToolError;
pub use server::McpServer;
pub use tools::{ToolKind, ToolRequest, Toolbox};
