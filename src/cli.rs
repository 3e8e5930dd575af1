use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use data_explorer::config::{
    ExplorerConfig, config_path, load_config, load_config_from, save_config, save_config_to,
};
use data_explorer::tools::{LOAD_CSV, RUN_SCRIPT, ToolHost, list_tools};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "data-explorer",
    version,
    about = "Load CSV files and run analysis scripts against them"
)]
pub struct Cli {
    /// Path to a JSON config file. Defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Python interpreter used by run-script
    #[arg(long, global = true, env = "EXPLORER_PYTHON")]
    pub python: Option<String>,

    /// Log to stderr only
    #[arg(long, global = true)]
    pub no_file_log: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve tool calls as JSON-RPC over stdin/stdout (default)
    Serve,
    /// Load one CSV file and print its summary
    Load {
        /// Path to the CSV file
        csv: String,

        /// Dataset name. Defaults to df_1.
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Load files, then run a Python script against them
    Run {
        /// Path to the script file
        script: PathBuf,

        /// CSV to load first, as PATH or PATH=NAME. Repeatable.
        #[arg(short, long = "load")]
        loads: Vec<String>,
    },
    /// Print the tool descriptors as JSON
    Tools,
    /// Print the effective configuration as JSON
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

impl Cli {
    /// File config, then env overrides, then flags.
    pub fn resolve_config(&self) -> ExplorerConfig {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = load_config_from(path);
                config.apply_env_overrides();
                config
            }
            None => load_config(),
        };
        if let Some(python) = &self.python {
            config.python_executable.clone_from(python);
        }
        if self.no_file_log {
            config.file_logging = false;
        }
        config
    }
}

/// Splits `PATH=NAME`; a bare path gets a minted name.
fn split_load_spec(spec: &str) -> (&str, Option<&str>) {
    match spec.rsplit_once('=') {
        Some((path, name)) if !path.is_empty() && !name.is_empty() => (path, Some(name)),
        _ => (spec, None),
    }
}

/// Writes `config` to `file`, or to the platform config path when `None`.
fn save_effective(config: &ExplorerConfig, file: Option<&Path>) -> Result<PathBuf> {
    match file {
        Some(path) => {
            save_config_to(config, path)?;
            Ok(path.to_path_buf())
        }
        None => {
            save_config(config)?;
            Ok(config_path())
        }
    }
}

pub async fn run_command(
    host: ToolHost,
    config: &ExplorerConfig,
    config_file: Option<&Path>,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Serve => {
            data_explorer::server::serve_stdio(host).await?;
        }
        Commands::Load { csv, name } => {
            let text = host
                .call_tool(LOAD_CSV, &json!({ "csv_path": csv, "df_name": name }))
                .await;
            println!("{text}");
        }
        Commands::Run { script, loads } => {
            for spec in &loads {
                let (path, name) = split_load_spec(spec);
                let text = host
                    .call_tool(LOAD_CSV, &json!({ "csv_path": path, "df_name": name }))
                    .await;
                if text.starts_with("Error") {
                    anyhow::bail!("{text}");
                }
                eprintln!("{}", text.lines().next().unwrap_or_default());
            }
            let source = std::fs::read_to_string(&script)
                .with_context(|| format!("Failed to read script {}", script.display()))?;
            let text = host.call_tool(RUN_SCRIPT, &json!({ "script": source })).await;
            println!("{text}");
        }
        Commands::Tools => {
            let descriptors = serde_json::to_string_pretty(&list_tools())?;
            println!("{descriptors}");
        }
        Commands::Config { save } => {
            println!("{}", serde_json::to_string_pretty(config)?);
            if save {
                let path = save_effective(config, config_file)?;
                eprintln!("Saved config to {}", path.display());
            }
        }
    }
    Ok(())
}
