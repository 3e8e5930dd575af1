//! Descriptive profile of a loaded dataset.
//!
//! The profile is recomputed from the stored frame on every load and never
//! cached. It is a pure function of the frame: shape, then per column the
//! declared type, distinct and missing counts, and for numeric columns the
//! min/max/mean over present values.
//!
//! Missing means null, plus NaN for floating columns. Missing cells are
//! excluded from every statistic; a numeric column with no present values
//! reports `NaN` rather than failing.

use crate::error::Result;
use crate::utils::fmt_opt;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
    Boolean,
}

impl ColumnKind {
    pub fn from_dtype(dtype: &DataType) -> Self {
        if dtype.is_bool() {
            Self::Boolean
        } else if dtype.is_primitive_numeric() {
            Self::Numeric
        } else if dtype.is_temporal() {
            Self::Temporal
        } else {
            Self::Text
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Temporal => "temporal",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub kind: ColumnKind,
    pub distinct: usize,
    pub missing: usize,
    pub numeric: Option<NumericSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
}

impl ProfileSummary {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for ProfileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape: {} rows × {} columns", self.rows, self.columns.len())?;
        write!(f, "\n\nColumns:")?;
        for col in &self.columns {
            write!(
                f,
                "\n  - {}: {} [{}] (unique: {}, missing: {}",
                col.name, col.dtype, col.kind, col.distinct, col.missing
            )?;
            if let Some(stats) = &col.numeric {
                write!(
                    f,
                    ", min: {}, max: {}, mean: {:.2}",
                    fmt_opt(stats.min),
                    fmt_opt(stats.max),
                    stats.mean.unwrap_or(f64::NAN)
                )?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Profiles every column of `df` in column order.
///
/// # Errors
///
/// Returns an error if a numeric column cannot be viewed as `f64`.
pub fn summarize(df: &DataFrame) -> Result<ProfileSummary> {
    let columns = df
        .get_columns()
        .iter()
        .map(profile_column)
        .collect::<Result<Vec<_>>>()?;

    Ok(ProfileSummary {
        rows: df.height(),
        columns,
    })
}

fn profile_column(col: &Column) -> Result<ColumnProfile> {
    let series = col.as_materialized_series();
    let dtype = series.dtype();
    let kind = ColumnKind::from_dtype(dtype);

    let (distinct, missing, numeric) = if kind == ColumnKind::Numeric {
        let values = present_values(series)?;
        let nan_count = series.len() - series.null_count() - values.len();
        let distinct = values
            .iter()
            .map(|v| if *v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() })
            .collect::<HashSet<_>>()
            .len();
        (
            distinct,
            series.null_count() + nan_count,
            Some(numeric_summary(&values)),
        )
    } else {
        let distinct = series.drop_nulls().n_unique()?;
        (distinct, series.null_count(), None)
    };

    Ok(ColumnProfile {
        name: series.name().to_string(),
        dtype: dtype.to_string(),
        kind,
        distinct,
        missing,
        numeric,
    })
}

/// Non-null, non-NaN values of a numeric column as `f64`.
fn present_values(series: &Series) -> Result<Vec<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    let ca = cast.f64()?;
    Ok(ca.into_iter().flatten().filter(|v| !v.is_nan()).collect())
}

fn numeric_summary(values: &[f64]) -> NumericSummary {
    if values.is_empty() {
        return NumericSummary {
            min: None,
            max: None,
            mean: None,
        };
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    NumericSummary {
        min: Some(min),
        max: Some(max),
        mean: Some(mean),
    }
}
