// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Label list loading.
//!
//! Label `i` names output logit `i`, so labels are kept in file order and
//! never sorted.

use std::fs;
use std::path::Path;

/// Load labels from a newline-delimited text file.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<String>, LabelError> {
    let text = fs::read_to_string(path.as_ref()).map_err(|e| LabelError::Io(e.to_string()))?;
    parse_labels(&text)
}

/// Parse labels from text, one per line.
///
/// Trailing whitespace (including `\r`) is trimmed. Blank lines at the end of
/// the file are ignored; a blank line in the middle is an error since it would
/// shift every later index.
pub fn parse_labels(text: &str) -> Result<Vec<String>, LabelError> {
    let mut labels: Vec<String> = text.lines().map(|l| l.trim_end().to_string()).collect();

    while labels.last().is_some_and(|l| l.is_empty()) {
        labels.pop();
    }

    if labels.is_empty() {
        return Err(LabelError::Empty);
    }

    if let Some(line) = labels.iter().position(|l| l.is_empty()) {
        return Err(LabelError::BlankLine(line + 1));
    }

    Ok(labels)
}

/// Errors from label loading.
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("Failed to read label file: {0}")]
    Io(String),

    #[error("Label file contains no labels")]
    Empty,

    #[error("Blank label on line {0}")]
    BlankLine(usize),
}
