//! Per-run execution namespace.
//!
//! The namespace is described by a manifest: a fixed table of library
//! handles plus one entry per registered dataset. Datasets cross into the
//! interpreter as CSV files in the run's private directory; temporal columns
//! are listed so they come back as dates rather than strings.

use crate::error::{Result, ResultExt as _};
use crate::registry::Snapshot;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Conventional short names bound in every script namespace.
pub const LIBRARY_HANDLES: &[(&str, &str)] = &[
    ("pd", "pandas"),
    ("np", "numpy"),
    ("plt", "matplotlib.pyplot"),
    ("sns", "seaborn"),
    ("sklearn", "sklearn"),
    ("stats", "scipy.stats"),
];

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LibraryHandle {
    pub alias: String,
    pub module: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DatasetExport {
    pub name: String,
    pub path: PathBuf,
    pub temporal: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Manifest {
    pub libraries: Vec<LibraryHandle>,
    pub datasets: Vec<DatasetExport>,
}

impl Manifest {
    pub fn identifiers(&self) -> Vec<&str> {
        self.libraries
            .iter()
            .map(|l| l.alias.as_str())
            .chain(self.datasets.iter().map(|d| d.name.as_str()))
            .collect()
    }
}

fn library_handles() -> Vec<LibraryHandle> {
    LIBRARY_HANDLES
        .iter()
        .map(|(alias, module)| LibraryHandle {
            alias: (*alias).to_owned(),
            module: (*module).to_owned(),
        })
        .collect()
}

fn temporal_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| matches!(col.dtype(), DataType::Date | DataType::Datetime(_, _)))
        .map(|col| col.name().to_string())
        .collect()
}

/// Writes every dataset of `snapshot` into `dir` and returns the manifest
/// describing the namespace. File names are positional so arbitrary dataset
/// names never reach the filesystem.
///
/// # Errors
///
/// Returns an error if a dataset cannot be written.
pub fn export_snapshot(snapshot: &Snapshot, dir: &Path) -> Result<Manifest> {
    let mut datasets = Vec::with_capacity(snapshot.len());

    for (index, (name, df)) in snapshot.iter().enumerate() {
        let path = dir.join(format!("dataset_{index}.csv"));
        let file = File::create(&path)?;
        let mut frame = df.as_ref().clone();
        CsvWriter::new(file)
            .include_header(true)
            .finish(&mut frame)
            .with_context(|| format!("Failed to export dataset {name}"))?;

        datasets.push(DatasetExport {
            name: name.clone(),
            path,
            temporal: temporal_columns(df),
        });
    }

    Ok(Manifest {
        libraries: library_handles(),
        datasets,
    })
}

/// # Errors
///
/// Returns an error if the manifest cannot be serialized or written.
pub fn write_manifest(manifest: &Manifest, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(MANIFEST_FILE);
    let content = serde_json::to_string(manifest)?;
    std::fs::write(&path, content)?;
    Ok(path)
}
