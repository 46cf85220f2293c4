use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use thiserror::Error;

use crate::reports::{DeptStats, HallOfFame, NewCourse};
use crate::student::Record;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to lock {path}: {source}")]
    Lock {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A report paired with the delimiter closing its section.
struct Section<'a, T: ?Sized> {
    report: &'a T,
    delimiter: &'a str,
}

fn write_records(f: &mut fmt::Formatter<'_>, records: &[Record]) -> fmt::Result {
    for record in records {
        writeln!(f, "{} / {:.1}", record.id, record.cgpa)?;
    }
    Ok(())
}

impl fmt::Display for Section<'_, HallOfFame> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------- hall of fame ----------")?;
        writeln!(f, "Total eligible students: {}", self.report.eligible)?;
        writeln!(f, "Qualified students:")?;
        write_records(f, &self.report.entries)?;
        writeln!(f, "{}", self.delimiter)
    }
}

impl fmt::Display for Section<'_, NewCourse> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "---------- new course candidates ----------")?;
        writeln!(f, "Input: {}: {:.1} to {:.1}", report.label, report.low, report.high)?;
        writeln!(f, "Total eligible students: {}", report.eligible)?;
        writeln!(f, "Qualified students:")?;
        write_records(f, &report.entries)?;
        writeln!(f, "{}", self.delimiter)
    }
}

impl fmt::Display for Section<'_, [DeptStats]> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------- department CGPA ----------")?;
        for dept in self.report {
            writeln!(f, "{}: max: {:.1}, avg: {:.1}", dept.dept, dept.max, dept.average)?;
        }
        writeln!(f, "{}", self.delimiter)
    }
}

pub fn render_hall_of_fame(report: &HallOfFame, delimiter: &str) -> String {
    Section { report, delimiter }.to_string()
}

pub fn render_new_course(report: &NewCourse, delimiter: &str) -> String {
    Section { report, delimiter }.to_string()
}

pub fn render_department_stats(stats: &[DeptStats], delimiter: &str) -> String {
    Section { report: stats, delimiter }.to_string()
}

/// Replaces the file contents, holding an exclusive advisory lock while
/// writing when `lock` is set. The lock is released when the file closes.
pub fn write_truncating(path: &Path, text: &str, lock: bool) -> Result<(), OutputError> {
    let display = || path.display().to_string();
    // truncate only after the lock is held
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|source| OutputError::Open { path: display(), source })?;
    if lock {
        file.lock_exclusive().map_err(|source| OutputError::Lock { path: display(), source })?;
    }
    file.set_len(0)
        .and_then(|_| file.write_all(text.as_bytes()))
        .and_then(|_| file.flush())
        .map_err(|source| OutputError::Write { path: display(), source })
}

pub fn append(path: &Path, text: &str) -> Result<(), OutputError> {
    let display = || path.display().to_string();
    let mut file: File = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|source| OutputError::Open { path: display(), source })?;
    file.write_all(text.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|source| OutputError::Write { path: display(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StoreConfig, DELIMITER};
    use crate::student::StudentId;

    fn record(raw: &str, cgpa: f64) -> Record {
        let id = StudentId::parse(raw, &StoreConfig::default()).unwrap();
        Record { id, cgpa }
    }

    #[test]
    fn renders_hall_of_fame() {
        let report = HallOfFame { eligible: 2, entries: vec![record("2012CSE0001", 9.0)] };
        assert_eq!(
            render_hall_of_fame(&report, DELIMITER),
            format!(
                "---------- hall of fame ----------\n\
                 Total eligible students: 2\n\
                 Qualified students:\n\
                 2012CSE0001 / 9.0\n\
                 {DELIMITER}\n"
            )
        );
    }

    #[test]
    fn renders_new_course() {
        let report = NewCourse {
            label: "courseOffer".into(),
            low: 3.5,
            high: 4.0,
            eligible: 1,
            entries: vec![record("2014MEC0003", 3.75)],
        };
        let text = render_new_course(&report, "--");
        assert!(text.contains("Input: courseOffer: 3.5 to 4.0\n"));
        assert!(text.contains("2014MEC0003 / 3.8\n"));
        assert!(text.ends_with("Qualified students:\n2014MEC0003 / 3.8\n--\n"));
    }

    #[test]
    fn renders_department_stats() {
        let stats = vec![
            DeptStats { dept: "CSE".into(), count: 2, max: 9.0, average: 8.8 },
            DeptStats { dept: "MEC".into(), count: 0, max: 0., average: 0. },
        ];
        assert_eq!(
            render_department_stats(&stats, "--"),
            "---------- department CGPA ----------\nCSE: max: 9.0, avg: 8.8\nMEC: max: 0.0, avg: 0.0\n--\n"
        );
    }

    #[test]
    fn truncating_write_replaces_and_append_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        std::fs::write(&path, "stale contents from an earlier run\n").unwrap();

        write_truncating(&path, "first\n", true).unwrap();
        append(&path, "second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");

        write_truncating(&path, "again\n", false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "again\n");
    }

    #[test]
    fn lock_is_released_after_truncating_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        write_truncating(&path, "first\n", true).unwrap();

        let other = OpenOptions::new().write(true).open(&path).unwrap();
        other.try_lock_exclusive().unwrap();
        FileExt::unlock(&other).unwrap();
        write_truncating(&path, "second\n", true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
    }

    #[test]
    fn append_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.txt");
        append(&path, "x\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n");
    }

    #[test]
    fn open_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        assert!(matches!(append(&path, "x"), Err(OutputError::Open { .. })));
    }
}
