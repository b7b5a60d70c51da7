//! Interchange format between extraction and plotting.
//!
//! One row per line, `<sequence number>\t<delta ms>`, no header. Deltas are
//! written in shortest round-trip form with an explicit fractional part.

use crate::delta::{DeltaRow, DeltaSeries};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum TsvError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Malformed {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

impl fmt::Display for TsvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsvError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            TsvError::Malformed {
                path,
                line,
                content,
            } => write!(
                f,
                "{}:{}: expected `<sequence>\\t<delta>`, got {:?}",
                path.display(),
                line,
                content
            ),
        }
    }
}

impl std::error::Error for TsvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TsvError::Io { source, .. } => Some(source),
            TsvError::Malformed { .. } => None,
        }
    }
}

/// Write rows to any writer.
pub fn write_rows<W: Write>(writer: &mut W, rows: &[DeltaRow]) -> std::io::Result<()> {
    for row in rows {
        writeln!(writer, "{}\t{:?}", row.seq, row.delta_ms)?;
    }
    Ok(())
}

/// Write a series to `path`, replacing any existing file.
pub fn write_series(path: &Path, series: &DeltaSeries) -> Result<(), TsvError> {
    let io_err = |source| TsvError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    write_rows(&mut writer, series.rows()).map_err(io_err)?;
    writer.flush().map_err(io_err)
}

/// Parse rows from a reader. `path` is only used in error messages.
pub fn read_rows<R: BufRead>(reader: R, path: &Path) -> Result<Vec<DeltaRow>, TsvError> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| TsvError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim_end_matches('\r');
        if trimmed.trim().is_empty() {
            continue;
        }
        let malformed = || TsvError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            content: trimmed.to_string(),
        };

        let mut fields = trimmed.split('\t');
        let (Some(seq), Some(delta), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(malformed());
        };
        let seq = seq.trim().parse::<i64>().map_err(|_| malformed())?;
        let delta_ms = delta.trim().parse::<f64>().map_err(|_| malformed())?;
        rows.push(DeltaRow { seq, delta_ms });
    }
    Ok(rows)
}

/// Read a series from `path` with the given display label.
pub fn read_series(path: &Path, label: impl Into<String>) -> Result<DeltaSeries, TsvError> {
    let file = File::open(path).map_err(|source| TsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_rows(BufReader::new(file), path)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "series loaded");
    Ok(DeltaSeries::new(label, rows))
}
