use std::path::Path;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    HallOfFame,
    NewCourse { label: String, low: f64, high: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("line {line}: expected `label:low:high` or the hall of fame trigger, got {text:?}")]
    Unrecognised { line: usize, text: String },
    #[error("line {line}: cgpa bound {value:?} is not a number")]
    BadBound { line: usize, value: String },
}

pub fn parse_line(line: &str, line_no: usize, trigger: &str) -> Result<Option<Prompt>, PromptError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.contains(trigger) {
        return Ok(Some(Prompt::HallOfFame));
    }

    let fields: Vec<&str> = line.split(':').map(str::trim).collect();
    let [label, low, high] = fields[..] else {
        return Err(PromptError::Unrecognised { line: line_no, text: line.to_string() });
    };
    let bound = |value: &str| {
        fast_float::parse::<f64, _>(value)
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| PromptError::BadBound { line: line_no, value: value.to_string() })
    };
    let (mut low, mut high) = (bound(low)?, bound(high)?);
    if low > high {
        std::mem::swap(&mut low, &mut high);
    }
    Ok(Some(Prompt::NewCourse { label: label.to_string(), low, high }))
}

pub fn parse(text: &str, trigger: &str) -> Vec<Prompt> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| match parse_line(line, i + 1, trigger) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(error = %err, "skipping prompt");
                None
            }
        })
        .collect()
}

/// A missing prompt file is logged and yields no prompts.
pub fn read(path: &Path, trigger: &str) -> Vec<Prompt> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse(&text, trigger),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot read prompt file");
            Vec::new()
        }
    }
}
