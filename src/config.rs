use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const DEPARTMENTS: [&str; 4] = ["CSE", "MEC", "ECE", "ARC"];
pub const TABLE_SIZE: usize = 650_000;
pub const HASHING_SEED: u64 = 1_000_000;
pub const BASE_YEAR: u16 = 2000;
pub const STUDENT_ID_LENGTH: usize = 11;
pub const DELIMITER: &str = "-------------------------------------";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Every knob the store and the reports depend on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub departments: Vec<String>,
    pub table_size: usize,
    pub hashing_seed: u64,
    pub base_year: u16,
    pub min_year: u16,
    pub max_year: u16,
    pub id_length: usize,
    pub course_years: u16,
    pub lookback_years: u16,
    /// Falls back to the current UTC year when unset.
    pub current_year: Option<u16>,
    pub hall_of_fame_trigger: String,
    pub delimiter: String,
    pub lock_output: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            departments: DEPARTMENTS.iter().map(|d| d.to_string()).collect(),
            table_size: TABLE_SIZE,
            hashing_seed: HASHING_SEED,
            base_year: BASE_YEAR,
            min_year: 2010,
            max_year: 2016,
            id_length: STUDENT_ID_LENGTH,
            course_years: 4,
            lookback_years: 5,
            current_year: None,
            hall_of_fame_trigger: "hallOfFame".to_string(),
            delimiter: DELIMITER.to_string(),
            lock_output: true,
        }
    }
}

impl StoreConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.departments.is_empty() {
            return Err(ConfigError::Invalid("department list is empty".into()));
        }
        for (i, dept) in self.departments.iter().enumerate() {
            if dept.len() != 3 || !dept.bytes().all(|b| b.is_ascii_uppercase()) {
                return Err(ConfigError::Invalid(format!(
                    "department code {dept:?} is not three uppercase letters"
                )));
            }
            if self.departments[..i].contains(dept) {
                return Err(ConfigError::Invalid(format!("department code {dept} is repeated")));
            }
        }
        if self.hall_of_fame_trigger.trim().is_empty() {
            return Err(ConfigError::Invalid("hall of fame trigger is empty".into()));
        }
        if self.table_size == 0 {
            return Err(ConfigError::Invalid("table size must be positive".into()));
        }
        if self.min_year > self.max_year {
            return Err(ConfigError::Invalid(format!(
                "year range {}..={} is inverted",
                self.min_year, self.max_year
            )));
        }
        if self.min_year < self.base_year {
            return Err(ConfigError::Invalid(format!(
                "minimum year {} precedes base year {}",
                self.min_year, self.base_year
            )));
        }
        if self.max_year > 9999 {
            return Err(ConfigError::Invalid(format!("year {} has more than four digits", self.max_year)));
        }
        // year (4) + department (3) + at least one roll digit
        if self.id_length < 8 {
            return Err(ConfigError::Invalid(format!(
                "student id length {} leaves no room for a roll number",
                self.id_length
            )));
        }
        Ok(())
    }

    pub fn department_index(&self, code: &str) -> Option<usize> {
        self.departments.iter().position(|d| d == code)
    }

    pub fn current_year(&self) -> u16 {
        self.current_year.unwrap_or_else(|| {
            let year = time::OffsetDateTime::now_utc().year();
            u16::try_from(year).unwrap_or(u16::MAX)
        })
    }
}
