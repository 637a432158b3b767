use std::fs::{self, DirBuilder};
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VocabError};

lazy_static! {
    static ref LEVEL_TAG: Regex =
        Regex::new(r"\b([ABC][12])\b").expect("valid level tag pattern");
}

/// One non-empty line of the word list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub text: String,
    pub source_file: String,
    /// 1-based, blank lines included in the count.
    pub line_number: usize,
}

impl WordRecord {
    /// CEFR proficiency tag (A1..C2) carried by the entry, if any.
    pub fn level(&self) -> Option<&str> {
        LEVEL_TAG
            .captures(&self.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Creates a directory if it doesn't exist
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    DirBuilder::new().recursive(true).create(path)?;
    Ok(())
}

/// Every character that ends a line in the word list.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Splits on any of `LINE_BREAKS`, with `\r\n` counted as a single break.
/// A trailing terminator does not produce an extra empty line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        let Some(pos) = current.find(LINE_BREAKS) else {
            rest = None;
            return (!current.is_empty()).then_some(current);
        };

        let tail = &current[pos..];
        let width = if tail.starts_with("\r\n") {
            2
        } else {
            tail.chars().next().map_or(1, char::len_utf8)
        };
        rest = Some(&tail[width..]);
        Some(&current[..pos])
    })
}

/// Splits text into one record per non-blank line.
pub fn split_into_records(text: &str, source_file: &str) -> Vec<WordRecord> {
    split_lines(text)
        .enumerate()
        .filter_map(|(i, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(WordRecord {
                    text: trimmed.to_string(),
                    source_file: source_file.to_string(),
                    line_number: i + 1,
                })
            }
        })
        .collect()
}

/// Loads the word list at `path`. An empty result is a data error.
pub fn load_word_records(path: impl AsRef<Path>) -> Result<Vec<WordRecord>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(VocabError::DataFileNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let source_file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let records = split_into_records(&content, &source_file);
    if records.is_empty() {
        return Err(VocabError::EmptyCorpus(path.to_path_buf()));
    }
    Ok(records)
}
