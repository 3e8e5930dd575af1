//! # Data Explorer - tabular data tool host
//!
//! Loads CSV files into named in-memory datasets and runs analysis scripts
//! against them, returning captured text. A remote caller drives it through
//! two tools, `load-csv` and `run-script`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use data_explorer::{ExplorerConfig, build_host};
//! use serde_json::json;
//!
//! # async fn example() {
//! let host = build_host(&ExplorerConfig::default());
//! let loaded = host.call_tool("load-csv", &json!({"csv_path": "sales.csv"})).await;
//! println!("{loaded}");
//!
//! let output = host.call_tool("run-script", &json!({"script": "print(df_1.shape)"})).await;
//! println!("{output}");
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`registry`]: name → dataset mapping shared by every tool call
//! - [`ingest`]: size-adaptive CSV loading (direct or chunked)
//! - [`profile`]: per-column summary produced on every load
//! - [`script`]: Python execution with output capture
//! - [`tools`]: the text-only tool boundary
//! - [`server`]: JSON-RPC front over stdio
//! - [`error`]: error types and context helpers
//!
//! ## Concurrency
//!
//! The async front never parses or computes itself: CSV parsing, profiling,
//! and namespace export run on the blocking pool, and scripts run in a child
//! process. Calls may complete in a different order than they arrived.

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod profile;
pub mod registry;
pub mod script;
pub mod server;
pub mod tools;
pub mod utils;

pub use config::ExplorerConfig;
pub use error::{ExplorerError, Result};
pub use registry::DatasetRegistry;
pub use tools::ToolHost;

use ingest::{IngestOptions, IngestionPipeline};
use script::{ScriptEngine, ScriptOptions};

/// Wires one registry into the pipeline, the engine, and the tool host.
pub fn build_host(config: &ExplorerConfig) -> ToolHost {
    let registry = DatasetRegistry::new();
    let pipeline = IngestionPipeline::new(registry.clone(), IngestOptions::from(config));
    let engine = ScriptEngine::new(registry.clone(), ScriptOptions::from(config));
    ToolHost::new(registry, pipeline, engine)
}
