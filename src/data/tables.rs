//! CSV Table I/O
//!
//! Tables are the cache between pipeline stages. Reading never fails on data
//! quality: a missing file is an empty table, a malformed row is skipped and
//! counted. Only I/O failures surface as errors.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// Table I/O errors
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to read table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write table {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Rows loaded from one table, with data quality counters
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable<T> {
    pub rows: Vec<T>,
    /// Rows that failed to parse
    pub skipped: usize,
    /// The file did not exist
    pub missing: bool,
}

impl<T> LoadedTable<T> {
    fn missing() -> Self {
        Self { rows: Vec::new(), skipped: 0, missing: true }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn map_rows<U, F: FnMut(T) -> U>(self, f: F) -> LoadedTable<U> {
        LoadedTable {
            rows: self.rows.into_iter().map(f).collect(),
            skipped: self.skipped,
            missing: self.missing,
        }
    }
}

/// Load a CSV table with a header row
pub fn read_table<T: DeserializeOwned>(path: &Path) -> TableResult<LoadedTable<T>> {
    if !path.exists() {
        warn!("Table not found, treating as empty: {}", path.display());
        return Ok(LoadedTable::missing());
    }

    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|source| TableError::Read { path: path.to_path_buf(), source })?;
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content);

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (index, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) if e.is_io_error() => {
                return Err(TableError::Csv { path: path.to_path_buf(), source: e });
            }
            Err(e) => {
                // Header is line 1, first data row is line 2
                debug!("{}: skipping row {}: {}", path.display(), index + 2, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("{}: skipped {} malformed row(s)", path.display(), skipped);
    }
    debug!("Loaded {} row(s) from {}", rows.len(), path.display());

    Ok(LoadedTable { rows, skipped, missing: false })
}

/// Write serializable rows under an explicit header. The header is written
/// even for an empty table so downstream stages see the columns.
pub fn write_table<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> TableResult<()> {
    let mut writer = open_writer(path)?;
    writer
        .write_record(headers)
        .map_err(|source| TableError::Csv { path: path.to_path_buf(), source })?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|source| TableError::Csv { path: path.to_path_buf(), source })?;
    }
    finish(writer, path)
}

/// Write pre-rendered string records
pub fn write_records<I>(path: &Path, headers: &[String], records: I) -> TableResult<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = open_writer(path)?;
    writer
        .write_record(headers)
        .map_err(|source| TableError::Csv { path: path.to_path_buf(), source })?;
    for record in records {
        writer
            .write_record(&record)
            .map_err(|source| TableError::Csv { path: path.to_path_buf(), source })?;
    }
    finish(writer, path)
}

fn open_writer(path: &Path) -> TableResult<csv::Writer<BufWriter<File>>> {
    let write_error = |source| TableError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let mut file = BufWriter::new(File::create(path).map_err(write_error)?);
    // BOM keeps spreadsheet tools from mangling non-ASCII names
    file.write_all(UTF8_BOM).map_err(write_error)?;

    Ok(csv::WriterBuilder::new().has_headers(false).from_writer(file))
}

fn finish(mut writer: csv::Writer<BufWriter<File>>, path: &Path) -> TableResult<()> {
    writer
        .flush()
        .map_err(|source| TableError::Write { path: path.to_path_buf(), source })?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::{CommitRecord, DeveloperIdentity, IdentitySource};
    use tempfile::TempDir;

    #[test]
    fn test_missing_table_is_empty() {
        let dir = TempDir::new().unwrap();
        let table: LoadedTable<DeveloperIdentity> = read_table(&dir.path().join("absent.csv")).unwrap();
        assert!(table.missing);
        assert!(table.is_empty());
        assert_eq!(table.skipped, 0);
    }

    #[test]
    fn test_malformed_rows_are_skipped_and_counted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("commits.csv");
        fs::write(
            &path,
            "commit_sha,author_email,author_name,authored_date,title\n\
             a1,alice@example.com,Alice,2024-01-02 10:00:00 +0000,feat: one\n\
             a2,alice@example.com,Alice,yesterday-ish,feat: two\n\
             a3,bob@example.com,Bob,2024-01-03T09:30:00Z,fix: three\n",
        )
        .unwrap();

        let table: LoadedTable<CommitRecord> = read_table(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.skipped, 1);
        assert_eq!(table.rows[1].commit_sha, "a3");
    }

    #[test]
    fn test_bom_tolerated_and_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("developers.csv");
        let identity = DeveloperIdentity::new("dev@example.com", "Dév Ñame", IdentitySource::Git);

        write_table(&path, &["email", "username", "name", "commit_count", "source"], &[identity.clone()])
            .unwrap();
        let raw = fs::read(&path).unwrap();
        assert!(raw.starts_with(UTF8_BOM));

        let table: LoadedTable<DeveloperIdentity> = read_table(&path).unwrap();
        assert_eq!(table.rows, vec![identity]);
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("empty.csv");
        write_records(&path, &["email".to_string(), "score".to_string()], Vec::<Vec<String>>::new())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_start_matches('\u{feff}').trim(), "email,score");
    }
}
