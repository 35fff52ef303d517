//! Plain `key = value` parsing for the lines between conditional statements.
//!
//! The section parser only hands this module lines that contain no control
//! keywords, so no conditional structure ever reaches it.

use crate::models::ContentPart;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyValueError {
    #[error("line {line}: expected `key = value`, found {text:?}")]
    MissingDelimiter { line: usize, text: String },

    #[error("line {line}: empty key")]
    EmptyKey { line: usize },
}

fn is_comment(line: &str) -> bool {
    line.starts_with(';') || line.starts_with('#')
}

/// Parse a block of lines into a [`ContentPart`].
///
/// Blank lines and `;`/`#` comments are skipped. Keys and values are trimmed
/// and the first occurrence of a key wins. Any other line without a `=` fails
/// the whole block.
pub fn parse_key_values<'a, I>(lines: I) -> Result<ContentPart, KeyValueError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut part = ContentPart::new();

    for (line_no, raw) in lines.into_iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() || is_comment(line) {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| KeyValueError::MissingDelimiter {
                line: line_no + 1,
                text: line.to_string(),
            })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(KeyValueError::EmptyKey { line: line_no + 1 });
        }

        part.insert(key, value.trim());
    }

    Ok(part)
}
