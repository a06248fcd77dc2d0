// Raw CSV ingestion.
//
// Everything read here stays text: no type inference happens until the
// dataset pipelines in `datasets.rs` convert cells into typed rows. The
// loader's only jobs are delimiter handling, rectangularity checking, and
// the process-wide parse cache.
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use thiserror::Error;

/// Fatal ingestion failures. Row-level data quality problems never surface
/// here; those are recovered locally by the dataset pipelines.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no attempted delimiter parses {} into a rectangular table", path.display())]
    DelimiterDetection { path: PathBuf },
    #[error("required column '{column}' is missing in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },
}

/// A parsed delimited file with every cell kept as text and header order
/// preserved exactly. Always rectangular: each row has `headers.len()`
/// cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Case-insensitive header lookup, so column order in the source file
    /// and header casing are both irrelevant to callers.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let want = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == want)
    }
}

/// Resolve the indices of required columns, failing with the first missing
/// one. A missing required column is a fatal error for the page, same as an
/// undetectable delimiter.
pub fn require_columns(
    table: &RawTable,
    path: &Path,
    columns: &[&str],
) -> Result<Vec<usize>, IngestError> {
    columns
        .iter()
        .map(|c| {
            table.column_index(c).ok_or_else(|| IngestError::MissingColumn {
                path: path.to_path_buf(),
                column: (*c).to_string(),
            })
        })
        .collect()
}

/// Try one delimiter. `None` means the candidate does not produce a
/// rectangular table (ragged rows, or the reader rejects the input).
fn parse_with_delimiter(content: &str, delimiter: u8) -> Option<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers: Vec<String> = rdr.headers().ok()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return None;
    }
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.ok()?;
        if record.len() != headers.len() {
            return None;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Some(RawTable { headers, rows })
}

/// Generic sniff: the most frequent candidate separator in the header line.
fn sniff_delimiter(content: &str) -> Option<u8> {
    let first_line = content.lines().next()?;
    [b';', b',', b'\t', b'|']
        .into_iter()
        .map(|d| (d, first_line.bytes().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
}

/// Load a delimited file into a [`RawTable`].
///
/// With `Some(delimiter)` the file must parse rectangularly under exactly
/// that delimiter. With `None` the loader probes `;`, then `,`, then the
/// sniffed header separator, accepting the first candidate that yields a
/// rectangular table with at least two columns (a wrong delimiter trivially
/// "succeeds" as one wide column, so single-column parses don't count as a
/// detection). All candidates failing is one aggregated error naming the
/// path.
pub fn load_table(path: &Path, delimiter: Option<u8>) -> Result<RawTable, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match delimiter {
        Some(d) => parse_with_delimiter(&content, d).ok_or_else(|| {
            IngestError::DelimiterDetection {
                path: path.to_path_buf(),
            }
        }),
        None => {
            let mut candidates = vec![b';', b','];
            if let Some(sniffed) = sniff_delimiter(&content) {
                if !candidates.contains(&sniffed) {
                    candidates.push(sniffed);
                }
            }
            for d in candidates {
                if let Some(table) = parse_with_delimiter(&content, d) {
                    if table.headers.len() >= 2 {
                        return Ok(table);
                    }
                }
            }
            Err(IngestError::DelimiterDetection {
                path: path.to_path_buf(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
}

// Read-through memoization of parsed tables, keyed by (path, modification
// signature). Append-only for the process lifetime: a file rewritten with
// an unchanged mtime and size keeps serving the cached parse until restart.
static TABLE_CACHE: Lazy<Mutex<HashMap<CacheKey, Arc<RawTable>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Memoized [`load_table`]. Repeated loads of an unchanged file return the
/// same parsed table without touching the parser again.
pub fn load_cached(path: &Path, delimiter: Option<u8>) -> Result<Arc<RawTable>, IngestError> {
    let meta = std::fs::metadata(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let key = CacheKey {
        path: path.to_path_buf(),
        modified: meta.modified().ok(),
        len: meta.len(),
    };
    if let Some(hit) = TABLE_CACHE.lock().unwrap().get(&key) {
        return Ok(Arc::clone(hit));
    }
    let table = Arc::new(load_table(path, delimiter)?);
    TABLE_CACHE
        .lock()
        .unwrap()
        .insert(key, Arc::clone(&table));
    Ok(table)
}
