//! CSV readers behind the two load strategies.
//!
//! Every pass goes through [`RawRecords`], which walks the file with the
//! `csv` crate and hands back each record's original bytes. Blank lines
//! between records are dropped and quoting is left untouched, so polars sees
//! the same text whichever strategy asked for it. The direct reader parses
//! all records at once; the chunked reader parses fixed-size segments
//! against a schema fixed up front and concatenates them in file order.

use crate::error::{Result, ResultExt as _};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufReader, Cursor, Read as _};
use std::path::Path;

/// Source bytes of a CSV file, one record at a time.
///
/// The first record is the header. Records must all have the header's
/// field count.
pub struct RawRecords {
    records: csv::Reader<File>,
    raw: BufReader<File>,
    record: csv::ByteRecord,
    /// Bytes of `raw` already consumed
    consumed: u64,
    /// Start offset of the record parsed but not yet copied
    pending: Option<u64>,
    len: u64,
    header: Vec<u8>,
}

impl RawRecords {
    /// Opens `path` and reads its header record.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be opened and
    /// `Parse` if the header is malformed.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let raw = BufReader::new(File::open(path)?);
        let records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .from_reader(file);

        let mut reader = Self {
            records,
            raw,
            record: csv::ByteRecord::new(),
            consumed: 0,
            pending: None,
            len,
            header: Vec::new(),
        };
        reader.pending = reader.parse_next()?;
        let mut header = Vec::new();
        reader.next_into(&mut header)?;
        reader.header = header;
        Ok(reader)
    }

    /// Header line, newline-terminated. Empty for an empty file.
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Appends the next record's bytes, newline-terminated, to `out`.
    /// Returns `false` once the file is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error on an unreadable or malformed record.
    pub fn next_into(&mut self, out: &mut Vec<u8>) -> Result<bool> {
        let Some(start) = self.pending.take() else {
            return Ok(false);
        };
        let next = self.parse_next()?;
        self.copy_record(start, next.unwrap_or(self.len), out)?;
        self.pending = next;
        Ok(true)
    }

    /// Parses one record ahead and returns where it starts.
    fn parse_next(&mut self) -> Result<Option<u64>> {
        if self.records.read_byte_record(&mut self.record)? {
            let start = self
                .record
                .position()
                .map_or(self.consumed, csv::Position::byte);
            Ok(Some(start))
        } else {
            Ok(None)
        }
    }

    fn copy_record(&mut self, start: u64, end: u64, out: &mut Vec<u8>) -> Result<()> {
        if start > self.consumed {
            std::io::copy(
                &mut (&mut self.raw).take(start - self.consumed),
                &mut std::io::sink(),
            )?;
        }
        let mut bytes = Vec::new();
        (&mut self.raw)
            .take(end.saturating_sub(start))
            .read_to_end(&mut bytes)?;
        self.consumed = end.max(start);

        // Terminators of this record and any blank lines around it.
        let is_break = |b: &u8| *b == b'\n' || *b == b'\r';
        let first = bytes.iter().position(|b| !is_break(b)).unwrap_or(bytes.len());
        let last = bytes.iter().rposition(|b| !is_break(b)).map_or(first, |i| i + 1);
        out.extend_from_slice(&bytes[first..last]);
        out.push(b'\n');
        Ok(())
    }
}

fn base_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_try_parse_dates(true))
}

/// Header plus up to `limit` records (all when `None`).
fn collect_records(path: &Path, limit: Option<usize>) -> Result<Vec<u8>> {
    let mut records = RawRecords::open(path)?;
    let mut bytes = records.header().to_vec();
    let mut taken = 0_usize;
    while limit.is_none_or(|n| taken < n) && records.next_into(&mut bytes)? {
        taken += 1;
    }
    Ok(bytes)
}

fn parse_inferred(bytes: Vec<u8>) -> Result<DataFrame> {
    let df = base_options()
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

/// Parses the entire file in one pass. Column types are inferred over every
/// row.
///
/// # Errors
///
/// Returns `Parse` for malformed content and
/// `Io` if the file cannot be opened.
pub fn read_direct(path: &Path) -> Result<DataFrame> {
    let bytes = collect_records(path, None)?;
    parse_inferred(bytes).context("Failed to read CSV")
}

/// Counts data rows by streaming the file `chunk_rows` records at a time,
/// keeping nothing but the running total.
///
/// # Errors
///
/// Returns an error on the first unreadable or malformed record.
pub fn count_rows_chunked(path: &Path, chunk_rows: usize) -> Result<usize> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(file);
    let mut record = csv::ByteRecord::new();
    let mut total = 0_usize;

    loop {
        let mut in_chunk = 0_usize;
        while in_chunk < chunk_rows && reader.read_byte_record(&mut record)? {
            in_chunk += 1;
        }
        total += in_chunk;
        if in_chunk < chunk_rows {
            break;
        }
        tracing::debug!("Counted {total} rows so far in {}", path.display());
    }

    Ok(total)
}

/// Reads the first `rows` data rows for structure discovery.
///
/// # Errors
///
/// Returns `Parse` if the head of the file is malformed.
pub fn read_sample(path: &Path, rows: usize) -> Result<DataFrame> {
    let bytes = collect_records(path, Some(rows))?;
    parse_inferred(bytes).context("Failed to sample CSV")
}

/// Column schema of a frame, detached from the frame itself.
pub fn schema_of(df: &DataFrame) -> SchemaRef {
    let fields = df
        .get_columns()
        .iter()
        .map(|col| Field::new(col.name().clone(), col.dtype().clone()));
    Arc::new(Schema::from_iter(fields))
}

/// Streams the file in `chunk_rows`-record segments, parses each against
/// `schema`, and concatenates them in file order.
///
/// # Errors
///
/// Returns `Parse` if any segment is malformed or does not
/// fit `schema`; nothing partial is returned.
pub fn read_chunked(path: &Path, schema: &SchemaRef, chunk_rows: usize) -> Result<DataFrame> {
    let mut records = RawRecords::open(path)?;
    let mut accumulated: Option<DataFrame> = None;
    let mut segments = 0_usize;

    loop {
        let mut bytes = records.header().to_vec();
        let mut in_chunk = 0_usize;
        while in_chunk < chunk_rows && records.next_into(&mut bytes)? {
            in_chunk += 1;
        }
        if in_chunk == 0 {
            break;
        }

        let segment = parse_segment(bytes, schema)
            .with_context(|| format!("Failed to parse segment {}", segments + 1))?;
        segments += 1;

        match accumulated.as_mut() {
            Some(df) => {
                df.vstack_mut(&segment)?;
            }
            None => accumulated = Some(segment),
        }

        if in_chunk < chunk_rows {
            break;
        }
    }

    tracing::debug!("Parsed {segments} segment(s) from {}", path.display());
    Ok(accumulated.unwrap_or_else(|| DataFrame::empty_with_schema(schema)))
}

fn parse_segment(bytes: Vec<u8>, schema: &SchemaRef) -> Result<DataFrame> {
    let df = base_options()
        .with_schema(Some(Arc::clone(schema)))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}
