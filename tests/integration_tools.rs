//! End-to-end tests through the tool boundary
//!
//! Script tests need a Python interpreter; the ones that touch datasets also
//! need pandas. Each returns early when its requirements are missing.

use data_explorer::{ExplorerConfig, build_host};
use serde_json::json;
use std::process::Command;

fn python_has(modules: &[&str]) -> bool {
    let python = ExplorerConfig::default().python_executable;
    let code = if modules.is_empty() {
        "pass".to_owned()
    } else {
        modules
            .iter()
            .map(|m| format!("import {m}"))
            .collect::<Vec<_>>()
            .join("; ")
    };
    Command::new(python)
        .arg("-c")
        .arg(code)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_load_csv_reports_summary() {
    let host = build_host(&ExplorerConfig::default());
    let text = host
        .call_tool("load-csv", &json!({"csv_path": "testdata/scores.csv"}))
        .await;
    assert!(text.starts_with("Successfully loaded "), "got {text}");
    assert!(text.contains(" as df_1\n\nShape: 5 rows × 2 columns"), "got {text}");
    assert!(host.registry().contains("df_1"));
}

#[tokio::test]
async fn test_load_csv_chunked_reports_row_total() {
    let config = ExplorerConfig {
        chunk_threshold_bytes: 0,
        chunk_rows: 3,
        ..Default::default()
    };
    let host = build_host(&config);
    let text = host
        .call_tool(
            "load-csv",
            &json!({"csv_path": "testdata/grid.csv", "df_name": "grid"}),
        )
        .await;
    assert!(text.contains(" as grid (10 rows)\n\n"), "got {text}");
}

#[tokio::test]
async fn test_load_csv_missing_file() {
    let host = build_host(&ExplorerConfig::default());
    let text = host
        .call_tool("load-csv", &json!({"csv_path": "testdata/nope.csv"}))
        .await;
    assert!(text.starts_with("Error: File not found:"), "got {text}");
    assert!(host.registry().is_empty());
}

#[tokio::test]
async fn test_load_csv_malformed_file() {
    let host = build_host(&ExplorerConfig::default());
    let text = host
        .call_tool("load-csv", &json!({"csv_path": "testdata/ragged.csv"}))
        .await;
    assert!(text.starts_with("Error loading CSV: "), "got {text}");
    assert!(host.registry().is_empty());
}

#[tokio::test]
async fn test_run_script_stdout_only() {
    if !python_has(&[]) {
        eprintln!("skipping: no python interpreter");
        return;
    }
    let host = build_host(&ExplorerConfig::default());
    let text = host
        .call_tool("run-script", &json!({"script": "print('hello')"}))
        .await;
    assert_eq!(text, "Script output:\nhello\n");
}

#[tokio::test]
async fn test_run_script_with_stderr() {
    if !python_has(&[]) {
        eprintln!("skipping: no python interpreter");
        return;
    }
    let host = build_host(&ExplorerConfig::default());
    let script = "import sys\nprint('out')\nsys.stderr.write('careful\\n')\n";
    let text = host.call_tool("run-script", &json!({"script": script})).await;
    assert_eq!(text, "Script output:\nout\n\n\nErrors:\ncareful\n");
}

#[tokio::test]
async fn test_run_script_fault_includes_trace() {
    if !python_has(&[]) {
        eprintln!("skipping: no python interpreter");
        return;
    }
    let host = build_host(&ExplorerConfig::default());
    let text = host
        .call_tool("run-script", &json!({"script": "x = 1\n1 / 0\n"}))
        .await;
    assert!(
        text.starts_with("Error executing script: division by zero\nTraceback"),
        "got {text}"
    );
    assert!(text.contains("File \"<script>\", line 2"), "got {text}");
    assert!(text.contains("ZeroDivisionError: division by zero"), "got {text}");

    // The host keeps serving after a fault.
    let again = host
        .call_tool("run-script", &json!({"script": "print(2)"}))
        .await;
    assert_eq!(again, "Script output:\n2\n");
}

#[tokio::test]
async fn test_script_timeout_kills_run() {
    if !python_has(&[]) {
        eprintln!("skipping: no python interpreter");
        return;
    }
    let config = ExplorerConfig {
        script_timeout_secs: Some(1),
        ..Default::default()
    };
    let host = build_host(&config);

    let started = std::time::Instant::now();
    let text = host
        .call_tool(
            "run-script",
            &json!({"script": "import time\ntime.sleep(10)\nprint('late')"}),
        )
        .await;
    assert!(
        text.starts_with("Error executing script: Script execution timed out after 1 seconds"),
        "got {text}"
    );
    assert!(!text.contains("late"), "got {text}");
    assert!(started.elapsed() < std::time::Duration::from_secs(8));

    let again = host
        .call_tool("run-script", &json!({"script": "print('next')"}))
        .await;
    assert_eq!(again, "Script output:\nnext\n");
}

#[tokio::test]
async fn test_namespace_is_fresh_per_run() {
    if !python_has(&[]) {
        eprintln!("skipping: no python interpreter");
        return;
    }
    let host = build_host(&ExplorerConfig::default());
    host.call_tool("run-script", &json!({"script": "leftover = 5"}))
        .await;
    let text = host
        .call_tool(
            "run-script",
            &json!({"script": "print('leftover' in globals())"}),
        )
        .await;
    assert_eq!(text, "Script output:\nFalse\n");
}

#[tokio::test]
async fn test_script_sees_loaded_dataset() {
    if !python_has(&["pandas"]) {
        eprintln!("skipping: pandas not available");
        return;
    }
    let host = build_host(&ExplorerConfig::default());
    let loaded = host
        .call_tool(
            "load-csv",
            &json!({"csv_path": "testdata/grid.csv", "df_name": "df_1"}),
        )
        .await;
    assert!(loaded.starts_with("Successfully loaded"), "got {loaded}");

    let text = host
        .call_tool("run-script", &json!({"script": "print(df_1.shape)"}))
        .await;
    assert!(text.contains("(10, 3)"), "got {text}");

    // Rebinding inside a script never reaches the registry.
    host.call_tool("run-script", &json!({"script": "df_1 = None"}))
        .await;
    assert_eq!(host.registry().get("df_1").expect("still there").height(), 10);
}

#[tokio::test]
async fn test_script_sees_temporal_columns_as_dates() {
    if !python_has(&["pandas"]) {
        eprintln!("skipping: pandas not available");
        return;
    }
    let host = build_host(&ExplorerConfig::default());
    host.call_tool(
        "load-csv",
        &json!({"csv_path": "testdata/events.csv", "df_name": "events"}),
    )
    .await;
    let text = host
        .call_tool(
            "run-script",
            &json!({"script": "print(str(events['day'].dtype).startswith('datetime64'))"}),
        )
        .await;
    assert_eq!(text, "Script output:\nTrue\n");
}
