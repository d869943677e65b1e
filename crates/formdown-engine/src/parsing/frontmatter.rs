use serde_yaml::Value;

use crate::error::{LineIndex, ParseError, ParseErrorKind, SourcePos};
use crate::model::FormMetadata;

/// The only format version this engine reads and writes.
pub const FORMAT_VERSION: u32 = 1;

/// Engine-owned metadata key, stripped on parse and recomputed on serialize.
pub const SUMMARY_KEY: &str = "summary";

/// Spec-version marker key; its absence is a parse error.
pub const VERSION_KEY: &str = "formdown";

/// Split the leading `---` metadata block off the raw text.
///
/// Returns the parsed metadata, the body, and the body's byte offset into
/// the original text (for error positions).
pub fn split_frontmatter(text: &str) -> Result<(FormMetadata, &str, usize), ParseError> {
    let start_pos = SourcePos { line: 1, column: 1 };
    let Some(after_open) = text.strip_prefix("---\n") else {
        return Err(ParseError::new(start_pos, ParseErrorKind::MissingMetadata));
    };
    let (yaml, body_offset) = if let Some(i) = after_open.find("\n---\n") {
        (&after_open[..i + 1], 4 + i + 5)
    } else if let Some(yaml) = after_open.strip_suffix("\n---") {
        // Metadata block closing the file with no body.
        (yaml, text.len())
    } else {
        return Err(ParseError::new(start_pos, ParseErrorKind::MissingMetadata));
    };
    let body = &text[body_offset..];

    let lines = LineIndex::new(text);
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml).map_err(|e| {
        ParseError::new(
            lines.pos(4),
            ParseErrorKind::InvalidMetadata(e.to_string()),
        )
    })?;

    let mut metadata = FormMetadata::new(FORMAT_VERSION);
    let mut version = None;
    for (key, value) in mapping {
        let key_str = key.as_str().unwrap_or_default().to_string();
        match key_str.as_str() {
            VERSION_KEY => {
                version = value.as_u64().map(|v| v as u32);
                if version.is_none() {
                    return Err(ParseError::new(
                        lines.pos(4),
                        ParseErrorKind::InvalidMetadata(format!(
                            "`{VERSION_KEY}` must be an integer"
                        )),
                    ));
                }
            }
            // Derived, never trusted from input.
            SUMMARY_KEY => {}
            _ => {
                metadata.extra.insert(Value::String(key_str), value);
            }
        }
    }

    let Some(version) = version else {
        return Err(ParseError::new(
            lines.pos(4),
            ParseErrorKind::MissingVersionMarker,
        ));
    };
    if version != FORMAT_VERSION {
        return Err(ParseError::new(
            lines.pos(4),
            ParseErrorKind::UnsupportedVersion(version),
        ));
    }
    metadata.version = version;

    Ok((metadata, body, body_offset))
}
