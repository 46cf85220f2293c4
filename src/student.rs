use std::fmt;

use thiserror::Error;

use crate::config::StoreConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("student id {id:?} has length {actual}, expected {expected}")]
    Length { id: String, actual: usize, expected: usize },
    #[error("student id {0:?} is not ascii")]
    NotAscii(String),
    #[error("student id {0:?} has a malformed year")]
    MalformedYear(String),
    #[error("student id {id:?} has year {year} outside {min}..={max}")]
    YearOutOfRange { id: String, year: u16, min: u16, max: u16 },
    #[error("student id {id:?} has unknown department {dept:?}")]
    UnknownDepartment { id: String, dept: String },
    #[error("student id {0:?} has a malformed roll number")]
    MalformedRoll(String),
}

/// A validated student id: `YYYY` + department code + roll digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentId {
    raw: String,
    year: u16,
    dept: usize,
}

impl StudentId {
    pub fn parse(raw: &str, config: &StoreConfig) -> Result<Self, IdError> {
        if !raw.is_ascii() {
            return Err(IdError::NotAscii(raw.to_string()));
        }
        // year (4) + department (3) + at least one roll digit
        if raw.len() != config.id_length || raw.len() < 8 {
            return Err(IdError::Length {
                id: raw.to_string(),
                actual: raw.len(),
                expected: config.id_length,
            });
        }
        let (year, rest) = raw.split_at(4);
        let (dept, roll) = rest.split_at(3);

        if !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::MalformedYear(raw.to_string()));
        }
        let year = year.parse::<u16>().map_err(|_| IdError::MalformedYear(raw.to_string()))?;
        if year < config.min_year || year > config.max_year {
            return Err(IdError::YearOutOfRange {
                id: raw.to_string(),
                year,
                min: config.min_year,
                max: config.max_year,
            });
        }
        let dept = config.department_index(dept).ok_or_else(|| IdError::UnknownDepartment {
            id: raw.to_string(),
            dept: dept.to_string(),
        })?;
        if roll.is_empty() || !roll.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::MalformedRoll(raw.to_string()));
        }

        Ok(Self { raw: raw.to_string(), year, dept })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    /// Position of the department code in the configured list.
    pub fn dept(&self) -> usize {
        self.dept
    }

    pub fn dept_code(&self) -> &str {
        &self.raw[4..7]
    }

    /// Roll digits as written, leading zeros included.
    pub fn roll(&self) -> &str {
        &self.raw[7..]
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: StudentId,
    pub cgpa: f64,
}
