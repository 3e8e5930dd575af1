//! Size-adaptive CSV ingestion.
//!
//! `load` turns a path into a registered dataset plus a profile:
//!
//! ```text
//! normalize path ─> resolve name ─> stat file ─┬─ < threshold ─> direct parse ──────────────┐
//!                                              └─ ≥ threshold ─> count ─> sample ─> chunked ┤
//!                                                                                           v
//!                                                           register (pointer swap) ─> summarize
//! ```
//!
//! The count pass may fail without stopping the load; its total is then
//! reported as `Unknown`. The sample only fixes the column schema for the
//! chunked parse; statistics always come from the complete stored frame.
//! Nothing is registered unless the full parse succeeded.

pub mod reader;
pub mod strategy;

pub use strategy::{LoadStrategy, RowCount};

use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, Result};
use crate::logging::log_event;
use crate::profile::{ProfileSummary, summarize};
use crate::registry::DatasetRegistry;
use crate::utils::{fmt_mb, normalize_path, run_blocking};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LOG_TAG: &str = "Ingest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub chunk_threshold_bytes: u64,
    pub chunk_rows: usize,
    pub sample_rows: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from(&ExplorerConfig::default())
    }
}

impl From<&ExplorerConfig> for IngestOptions {
    fn from(config: &ExplorerConfig) -> Self {
        Self {
            chunk_threshold_bytes: config.chunk_threshold_bytes,
            chunk_rows: config.chunk_rows.max(1),
            sample_rows: config.sample_rows.max(1),
        }
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub name: String,
    pub path: PathBuf,
    pub strategy: LoadStrategy,
    pub total_rows: RowCount,
    pub summary: ProfileSummary,
}

impl LoadReport {
    /// Caller-facing text for the `load-csv` tool.
    pub fn message(&self) -> String {
        match self.strategy {
            LoadStrategy::Direct => format!(
                "Successfully loaded {} as {}\n\n{}",
                self.path.display(),
                self.name,
                self.summary
            ),
            LoadStrategy::Chunked => format!(
                "Successfully loaded {} as {} ({} rows)\n\n{}",
                self.path.display(),
                self.name,
                self.total_rows,
                self.summary
            ),
        }
    }
}

#[derive(Clone)]
pub struct IngestionPipeline {
    registry: DatasetRegistry,
    options: IngestOptions,
}

impl IngestionPipeline {
    pub fn new(registry: DatasetRegistry, options: IngestOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    /// Loads `path` on the blocking pool and registers it.
    ///
    /// # Errors
    ///
    /// [`ExplorerError::NotFound`] if the path is not a file; `Io` or `Parse`
    /// for unreadable or malformed content; `Worker` if the task panicked.
    pub async fn load(&self, path: &str, requested_name: Option<&str>) -> Result<LoadReport> {
        let pipeline = self.clone();
        let path = path.to_owned();
        let requested_name = requested_name.map(str::to_owned);
        run_blocking("csv-load", move || {
            pipeline.load_blocking(&path, requested_name.as_deref())
        })
        .await
    }

    /// Synchronous body of [`Self::load`]; steps run strictly in order.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_blocking(&self, path: &str, requested_name: Option<&str>) -> Result<LoadReport> {
        self.load_with(path, requested_name, reader::count_rows_chunked)
    }

    /// [`Self::load_blocking`] with the chunked row-count pass supplied by the caller.
    fn load_with<C>(
        &self,
        path: &str,
        requested_name: Option<&str>,
        count_rows: C,
    ) -> Result<LoadReport>
    where
        C: FnOnce(&Path, usize) -> Result<usize>,
    {
        let path = normalize_path(path);
        let name = self.registry.resolve_name(requested_name);
        let file_size = file_size(&path)?;
        let strategy = LoadStrategy::select(file_size, self.options.chunk_threshold_bytes);

        log_event(
            LOG_TAG,
            &format!(
                "Loading CSV file: {} ({}) as {name} using {strategy} strategy",
                path.display(),
                fmt_mb(file_size)
            ),
        );

        let (df, total_rows) = match strategy {
            LoadStrategy::Direct => {
                let df = reader::read_direct(&path)?;
                let rows = df.height();
                (df, RowCount::Known(rows))
            }
            LoadStrategy::Chunked => self.load_chunked(&path, count_rows)?,
        };

        let stored = Arc::new(df);
        self.registry.insert(name.clone(), Arc::clone(&stored))?;
        let summary = summarize(&stored)?;

        log_event(
            LOG_TAG,
            &format!(
                "Registered {name}: {} rows × {} columns",
                summary.rows,
                summary.column_count()
            ),
        );

        Ok(LoadReport {
            name,
            path,
            strategy,
            total_rows,
            summary,
        })
    }

    fn load_chunked<C>(&self, path: &Path, count_rows: C) -> Result<(DataFrame, RowCount)>
    where
        C: FnOnce(&Path, usize) -> Result<usize>,
    {
        let total_rows = match count_rows(path, self.options.chunk_rows) {
            Ok(n) => {
                log_event(LOG_TAG, &format!("Total rows in {}: {n}", path.display()));
                RowCount::Known(n)
            }
            Err(e) => {
                tracing::error!("Error counting rows in {}: {e}", path.display());
                RowCount::Unknown
            }
        };

        let sample = reader::read_sample(path, self.options.sample_rows)?;
        let schema = reader::schema_of(&sample);
        tracing::debug!(
            "Sampled {} rows from {}; columns: {:?}",
            sample.height(),
            path.display(),
            schema.iter_names().collect::<Vec<_>>()
        );
        drop(sample);

        log_event(LOG_TAG, &format!("Loading full file: {}", path.display()));
        let df = reader::read_chunked(path, &schema, self.options.chunk_rows)?;
        Ok((df, total_rows))
    }
}

fn file_size(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(meta.len()),
        Ok(_) => Err(ExplorerError::NotFound(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExplorerError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(ExplorerError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> String {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(contents.as_bytes()).expect("write");
        path.to_string_lossy().into_owned()
    }

    fn pipeline(threshold: u64) -> IngestionPipeline {
        IngestionPipeline::new(
            DatasetRegistry::new(),
            IngestOptions {
                chunk_threshold_bytes: threshold,
                chunk_rows: 2,
                sample_rows: 100,
            },
        )
    }

    const FIVE_ROWS: &str = "city,temp\nOslo,3.0\nRome,\nLima,20.0\nCairo,30.0\nNuuk,-7.0\n";

    #[test]
    fn test_direct_load_reports_shape() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_csv(dir.path(), "w.csv", FIVE_ROWS);
        let pipeline = pipeline(u64::MAX);

        let report = pipeline.load_blocking(&path, None).expect("load");
        assert_eq!(report.name, "df_1");
        assert_eq!(report.strategy, LoadStrategy::Direct);
        assert_eq!(report.total_rows, RowCount::Known(5));

        let stored = pipeline.registry().get("df_1").expect("registered");
        assert_eq!(stored.shape(), (report.summary.rows, report.summary.column_count()));

        let message = report.message();
        assert!(message.starts_with("Successfully loaded "), "got {message}");
        assert!(message.contains("Shape: 5 rows × 2 columns"), "got {message}");
        assert!(message.contains("missing: 1"), "got {message}");
        assert!(message.contains("mean: 11.50"), "got {message}");
    }

    #[test]
    fn test_chunked_load_matches_direct() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_csv(dir.path(), "w.csv", FIVE_ROWS);

        let direct = pipeline(u64::MAX);
        direct.load_blocking(&path, Some("w")).expect("direct");
        let chunked = pipeline(0);
        let report = chunked.load_blocking(&path, Some("w")).expect("chunked");

        assert_eq!(report.strategy, LoadStrategy::Chunked);
        assert_eq!(report.total_rows, RowCount::Known(5));
        assert!(report.message().contains("as w (5 rows)"));

        let a = direct.registry().get("w").expect("a");
        let b = chunked.registry().get("w").expect("b");
        assert!(a.equals_missing(&b), "strategies disagree:\n{a:?}\n{b:?}");
    }

    #[test]
    fn test_missing_file_registers_nothing() {
        let pipeline = pipeline(u64::MAX);
        let err = pipeline
            .load_blocking("/no/such/dir/data.csv", Some("ghost"))
            .unwrap_err();
        assert!(matches!(err, ExplorerError::NotFound(_)), "got {err:?}");
        assert!(pipeline.registry().is_empty());
    }

    #[test]
    fn test_directory_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipeline = pipeline(u64::MAX);
        let err = pipeline
            .load_blocking(&dir.path().to_string_lossy(), None)
            .unwrap_err();
        assert!(matches!(err, ExplorerError::NotFound(_)), "got {err:?}");
    }

    #[test]
    fn test_failed_parse_keeps_previous_dataset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = write_csv(dir.path(), "good.csv", "a\n1\n2\n");
        let bad = write_csv(dir.path(), "bad.csv", "a,b\n1,2\n3,4,5,6\n");
        let pipeline = pipeline(0);

        pipeline.load_blocking(&good, Some("t")).expect("good load");
        assert!(pipeline.load_blocking(&bad, Some("t")).is_err());
        assert_eq!(pipeline.registry().get("t").expect("kept").height(), 2);
    }

    #[test]
    fn test_failed_count_still_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_csv(dir.path(), "w.csv", FIVE_ROWS);
        let pipeline = pipeline(0);

        let report = pipeline
            .load_with(&path, Some("w"), |_, _| {
                Err(ExplorerError::Other("count interrupted".to_owned()))
            })
            .expect("load");
        assert_eq!(report.strategy, LoadStrategy::Chunked);
        assert_eq!(report.total_rows, RowCount::Unknown);
        assert_eq!(report.summary.rows, 5);
        let message = report.message();
        assert!(message.contains("as w (Unknown rows)\n\n"), "got {message}");
        assert_eq!(pipeline.registry().get("w").expect("registered").height(), 5);
    }

    #[test]
    fn test_count_pass_is_skipped_for_direct_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_csv(dir.path(), "w.csv", FIVE_ROWS);
        let report = pipeline(u64::MAX)
            .load_with(&path, None, |_, _| panic!("direct loads never count"))
            .expect("load");
        assert_eq!(report.total_rows, RowCount::Known(5));
    }

    #[tokio::test]
    async fn test_async_load_offloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_csv(dir.path(), "w.csv", FIVE_ROWS);
        let pipeline = pipeline(u64::MAX);
        let report = pipeline.load(&path, Some("weather")).await.expect("load");
        assert_eq!(report.name, "weather");
        assert!(pipeline.registry().contains("weather"));
    }
}
