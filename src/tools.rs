//! Tool dispatch: the fault-opaque boundary between callers and the core.
//!
//! Every call returns text. Failures are logged with full detail and turned
//! into `Error…` text; nothing propagates to the transport as a fault.

use crate::error::ExplorerError;
use crate::ingest::IngestionPipeline;
use crate::registry::DatasetRegistry;
use crate::script::ScriptEngine;
use serde::Serialize;
use serde_json::{Value, json};

pub const LOAD_CSV: &str = "load-csv";
pub const RUN_SCRIPT: &str = "run-script";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn list_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: LOAD_CSV,
            description: "Load a CSV file into a DataFrame for analysis",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "csv_path": {
                        "type": "string",
                        "description": "Path to the CSV file to load"
                    },
                    "df_name": {
                        "type": "string",
                        "description": "Name for the DataFrame (optional, defaults to df_1, df_2, etc.)"
                    }
                },
                "required": ["csv_path"]
            }),
        },
        ToolDescriptor {
            name: RUN_SCRIPT,
            description: "Execute a Python script for data analysis and visualization",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "script": {
                        "type": "string",
                        "description": "Python script to execute"
                    }
                },
                "required": ["script"]
            }),
        },
    ]
}

/// Owns the registry and the two operations that share it.
#[derive(Clone)]
pub struct ToolHost {
    registry: DatasetRegistry,
    pipeline: IngestionPipeline,
    engine: ScriptEngine,
}

impl ToolHost {
    pub fn new(registry: DatasetRegistry, pipeline: IngestionPipeline, engine: ScriptEngine) -> Self {
        Self {
            registry,
            pipeline,
            engine,
        }
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    /// Dispatches a named tool. Always returns caller-facing text.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> String {
        tracing::info!("Tool call: {name}");
        match name {
            LOAD_CSV => self.load_csv(arguments).await,
            RUN_SCRIPT => self.run_script(arguments).await,
            _ => {
                tracing::error!("Unknown tool: {name}");
                format!("Error: Unknown tool: {name}")
            }
        }
    }

    async fn load_csv(&self, arguments: &Value) -> String {
        let Some(csv_path) = string_arg(arguments, "csv_path") else {
            return missing_argument("csv_path");
        };
        let df_name = string_arg(arguments, "df_name");

        match self.pipeline.load(csv_path, df_name).await {
            Ok(report) => report.message(),
            Err(ExplorerError::NotFound(path)) => {
                tracing::error!("File not found: {}", path.display());
                format!("Error: File not found: {}", path.display())
            }
            Err(e @ ExplorerError::Worker(_)) => tool_failure(LOAD_CSV, &e),
            Err(e) => {
                tracing::error!("Error loading CSV {csv_path}: {e:?}");
                format!("Error loading CSV: {e}")
            }
        }
    }

    async fn run_script(&self, arguments: &Value) -> String {
        let Some(script) = string_arg(arguments, "script") else {
            return missing_argument("script");
        };

        match self.engine.run(script).await {
            Ok(text) => text,
            Err(ExplorerError::Execution { message, trace }) => {
                tracing::error!("Error executing script: {message}\n{trace}");
                format!("Error executing script: {message}\n{trace}")
            }
            Err(e @ ExplorerError::Worker(_)) => tool_failure(RUN_SCRIPT, &e),
            Err(e) => {
                tracing::error!("Error executing script: {e:?}");
                format!("Error executing script: {e}")
            }
        }
    }
}

/// Non-empty string argument, or `None` when absent, null, empty, or not a string.
fn string_arg<'a>(arguments: &'a Value, key: &str) -> Option<&'a str> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn missing_argument(field: &str) -> String {
    let err = ExplorerError::ArgumentMissing(field.to_owned());
    tracing::warn!("{err}");
    format!("Error: {err}")
}

fn tool_failure(name: &str, err: &ExplorerError) -> String {
    tracing::error!("Error executing tool {name}: {err:?}");
    format!("Error executing tool {name}: {err}")
}
