//! MCP server: configuration loading and the stdio runtime.
pub mod config;
pub mod runtime;
