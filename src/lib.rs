//! Minimal tool-dispatch gateway: a single-shot endpoint and a small JSON-RPC
//! surface (`mcp.list_tools`, `mcp.call_tool`) over a fixed tool registry.

pub mod api;
pub mod cli;
pub mod clients;
pub mod core;
pub mod infra;
pub mod tools;
