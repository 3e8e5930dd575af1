use crate::error::{ExplorerError, Result};
use std::path::{Component, Path, PathBuf};

/// Formats an optional f64 for summary output, or `NaN` when undefined.
pub fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if !x.is_nan() => format!("{x}"),
        _ => "NaN".to_owned(),
    }
}

/// Size in megabytes with two decimals, the way load events report it.
pub fn fmt_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Lexically normalizes a caller-supplied path to the host separator
/// convention: collapses repeated separators and `.` segments, and resolves
/// `..` against preceding normal segments. Does not touch the filesystem.
pub fn normalize_path(raw: &str) -> PathBuf {
    let raw = if cfg!(windows) {
        raw.replace('/', "\\")
    } else {
        raw.to_owned()
    };

    let mut out: Vec<Component<'_>> = Vec::new();
    for component in Path::new(&raw).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

/// Removes a directory tree when dropped.
pub struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create(prefix: &str) -> Result<Self> {
        let path = std::env::temp_dir().join(format!("{prefix}_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!("Failed to remove temp dir {}: {e}", self.path.display());
        }
    }
}

/// Runs CPU/IO-bound work on the blocking pool so the async front never
/// stalls. Panics inside `f` surface as [`ExplorerError::Worker`].
///
/// # Errors
///
/// Returns the closure's own error, or `Worker` if the task panicked.
pub async fn run_blocking<F, R>(name: &str, f: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    let task_name = name.to_owned();
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExplorerError::Worker(format!("{task_name}: {e}")))?
}
