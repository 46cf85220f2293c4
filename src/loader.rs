use std::fs::File;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("line {line}: missing '/' separator")]
    MissingSeparator { line: usize },
    #[error("line {line}: cgpa {value:?} is not a number")]
    BadCgpa { line: usize, value: String },
    #[error("line {line}: {source}")]
    Store {
        line: usize,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub lines: usize,
    pub inserted: usize,
    pub overwritten: usize,
    pub skipped: usize,
}

/// Loads `id/cgpa` lines into the store. Missing files and bad lines are
/// logged and skipped.
pub fn run(path: &Path, store: &mut RecordStore) -> LoadSummary {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot open input file");
            return LoadSummary::default();
        }
    };
    let empty = file.metadata().map(|m| m.len() == 0).unwrap_or(false);
    if empty {
        info!(path = %path.display(), "input file is empty");
        return LoadSummary::default();
    }
    // SAFETY: the map is read-only and dropped before this function returns.
    let mmap = match unsafe { memmap2::Mmap::map(&file) } {
        Ok(mmap) => mmap,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot map input file");
            return LoadSummary::default();
        }
    };
    let summary = load_bytes(&mmap, store);
    info!(
        path = %path.display(),
        lines = summary.lines,
        inserted = summary.inserted,
        overwritten = summary.overwritten,
        skipped = summary.skipped,
        "loaded records"
    );
    summary
}

pub fn load_bytes(data: &[u8], store: &mut RecordStore) -> LoadSummary {
    let mut summary = LoadSummary::default();
    let mut offset = Some(0);
    let mut line_no = 0;

    while let Some(o) = offset {
        if o >= data.len() {
            break;
        }
        let (line, next_offset) = next_line(data, o);
        offset = next_offset;
        line_no += 1;

        let line = trim(line);
        if line.is_empty() {
            continue;
        }
        summary.lines += 1;
        match do_line(line, line_no, store) {
            Ok(false) => summary.inserted += 1,
            Ok(true) => {
                summary.inserted += 1;
                summary.overwritten += 1;
            }
            Err(err) => {
                warn!(error = %err, "skipping input line");
                summary.skipped += 1;
            }
        }
    }
    summary
}

#[inline]
fn next_line(data: &[u8], start: usize) -> (&[u8], Option<usize>) {
    match data[start..].iter().position(|&b| b == b'\n') {
        Some(pos) => (&data[start..start + pos], Some(start + pos + 1)),
        None => (&data[start..], None),
    }
}

#[inline]
fn trim(line: &[u8]) -> &[u8] {
    let start = line.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(line.len());
    let end = line.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |p| p + 1);
    &line[start..end]
}

/// Returns whether the insert replaced an earlier record.
fn do_line(line: &[u8], line_no: usize, store: &mut RecordStore) -> Result<bool, LoadError> {
    let sep = line
        .iter()
        .position(|&b| b == b'/')
        .ok_or(LoadError::MissingSeparator { line: line_no })?;
    let key = String::from_utf8_lossy(trim(&line[..sep]));
    let value = trim(&line[sep + 1..]);

    let cgpa = fast_float::parse::<f64, _>(value)
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LoadError::BadCgpa {
            line: line_no,
            value: String::from_utf8_lossy(value).into_owned(),
        })?;

    match store.try_insert(&key, cgpa) {
        Ok(Some(previous)) => {
            warn!(line = line_no, id = %key, previous = %previous.id, "overwrote occupied slot");
            Ok(true)
        }
        Ok(None) => Ok(false),
        Err(source) => Err(LoadError::Store { line: line_no, source }),
    }
}
