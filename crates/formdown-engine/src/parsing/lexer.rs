//! The two front-end tag lexers.
//!
//! Both surface syntaxes share one attribute grammar and produce the same
//! [`LexedTag`] stream, so everything downstream of this module is
//! syntax-agnostic:
//!
//! - comment style: `<!-- field id="x" kind="string" ... -->`, `<!-- /field -->`,
//!   option annotation `<!-- #opt_id -->`
//! - directive style: `::field{id="x" kind="string"}`, `::/field`,
//!   option annotation `{#opt_id}`
//!
//! A comment or `::` line whose first token is not a known tag name is not
//! formdown syntax and is left to the surrounding Markdown as prose.

use crate::error::{LineIndex, ParseError, ParseErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagName {
    Form,
    Group,
    Field,
    Doc,
    Note,
}

impl TagName {
    pub fn as_str(self) -> &'static str {
        match self {
            TagName::Form => "form",
            TagName::Group => "group",
            TagName::Field => "field",
            TagName::Doc => "doc",
            TagName::Note => "note",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "form" => Some(TagName::Form),
            "group" => Some(TagName::Group),
            "field" => Some(TagName::Field),
            "doc" => Some(TagName::Doc),
            "note" => Some(TagName::Note),
            _ => None,
        }
    }
}

/// An opening tag with its raw attribute list, in authored order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTag {
    pub name: TagName,
    pub attrs: Vec<(String, String)>,
    pub offset: usize,
}

impl RawTag {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexedTag {
    Open(RawTag),
    Close { name: TagName, offset: usize },
    /// `#opt_id` annotation attaching an ID (and optional metadata) to the
    /// enclosing option list item.
    OptionAnnotation {
        id: String,
        metadata: Option<String>,
        offset: usize,
    },
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn malformed(
    lines: &LineIndex,
    offset: usize,
    tag: &str,
    message: impl Into<String>,
) -> ParseError {
    ParseError::new(
        lines.pos(offset),
        ParseErrorKind::MalformedTag {
            tag: tag.to_string(),
            message: message.into(),
        },
    )
}

/// Parse `key="value"` pairs plus bare boolean flags. Values are
/// entity-decoded so labels may carry quotes and comment-closing sequences.
fn parse_attrs(
    input: &str,
    tag: &str,
    offset: usize,
    lines: &LineIndex,
) -> Result<Vec<(String, String)>, ParseError> {
    let mut attrs = Vec::new();
    let mut rest = input.trim();
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        if !is_ident(key) {
            return Err(malformed(
                lines,
                offset,
                tag,
                format!("bad attribute name `{key}`"),
            ));
        }
        rest = rest[key_end..].trim_start();
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let Some(quoted) = after_eq.strip_prefix('"') else {
                return Err(malformed(
                    lines,
                    offset,
                    tag,
                    format!("attribute `{key}` value must be double-quoted"),
                ));
            };
            let Some(end) = quoted.find('"') else {
                return Err(malformed(
                    lines,
                    offset,
                    tag,
                    format!("unterminated value for attribute `{key}`"),
                ));
            };
            let value = html_escape::decode_html_entities(&quoted[..end]).into_owned();
            attrs.push((key.to_string(), value));
            rest = quoted[end + 1..].trim_start();
        } else {
            // Bare flag, e.g. `required`.
            attrs.push((key.to_string(), "true".to_string()));
        }
    }
    Ok(attrs)
}

/// Lex the inner text of an HTML comment (between `<!--` and `-->`).
///
/// Returns `Ok(None)` when the comment is not formdown syntax.
pub fn lex_comment(
    inner: &str,
    offset: usize,
    lines: &LineIndex,
) -> Result<Option<LexedTag>, ParseError> {
    let inner = inner.trim();
    if let Some(annotation) = inner.strip_prefix('#') {
        let (id, rest) = match annotation.find(char::is_whitespace) {
            Some(i) => (&annotation[..i], annotation[i..].trim()),
            None => (annotation, ""),
        };
        if !is_ident(id) {
            return Err(malformed(lines, offset, "#", format!("bad option ID `{id}`")));
        }
        let attrs = parse_attrs(rest, "#", offset, lines)?;
        let mut metadata = None;
        for (key, value) in attrs {
            if key == "meta" {
                metadata = Some(value);
            } else {
                return Err(ParseError::new(
                    lines.pos(offset),
                    ParseErrorKind::UnknownAttribute {
                        tag: "#".to_string(),
                        attr: key,
                    },
                ));
            }
        }
        return Ok(Some(LexedTag::OptionAnnotation {
            id: id.to_string(),
            metadata,
            offset,
        }));
    }
    if let Some(close) = inner.strip_prefix('/') {
        return Ok(TagName::from_str(close.trim()).map(|name| LexedTag::Close { name, offset }));
    }
    let (word, rest) = match inner.find(char::is_whitespace) {
        Some(i) => (&inner[..i], &inner[i..]),
        None => (inner, ""),
    };
    let Some(name) = TagName::from_str(word) else {
        return Ok(None);
    };
    let attrs = parse_attrs(rest, name.as_str(), offset, lines)?;
    Ok(Some(LexedTag::Open(RawTag { name, attrs, offset })))
}

/// Lex one `::`-prefixed directive line.
///
/// Returns `Ok(None)` when the line is not formdown syntax.
pub fn lex_directive(
    line: &str,
    offset: usize,
    lines: &LineIndex,
) -> Result<Option<LexedTag>, ParseError> {
    let Some(body) = line.trim_end().strip_prefix("::") else {
        return Ok(None);
    };
    if let Some(close) = body.strip_prefix('/') {
        return Ok(TagName::from_str(close.trim()).map(|name| LexedTag::Close { name, offset }));
    }
    let (word, rest) = match body.find('{') {
        Some(i) => (&body[..i], &body[i..]),
        None => (body.trim(), ""),
    };
    let Some(name) = TagName::from_str(word.trim()) else {
        return Ok(None);
    };
    if rest.is_empty() {
        return Ok(Some(LexedTag::Open(RawTag {
            name,
            attrs: Vec::new(),
            offset,
        })));
    }
    let Some(inner) = rest.strip_prefix('{').and_then(|r| r.strip_suffix('}')) else {
        return Err(malformed(
            lines,
            offset,
            name.as_str(),
            "directive attributes must be enclosed in `{...}`",
        ));
    };
    let attrs = parse_attrs(inner, name.as_str(), offset, lines)?;
    Ok(Some(LexedTag::Open(RawTag { name, attrs, offset })))
}

/// Split a trailing `{#id}` / `{#id meta="..."}` annotation off a list-item
/// label (the directive-style counterpart of `<!-- #id -->`).
pub fn split_brace_annotation(text: &str) -> Option<(&str, &str, Option<String>)> {
    let trimmed = text.trim_end();
    let open = trimmed.rfind("{#")?;
    let inner = trimmed[open..].strip_prefix("{#")?.strip_suffix('}')?;
    let (id, rest) = match inner.find(char::is_whitespace) {
        Some(i) => (&inner[..i], inner[i..].trim()),
        None => (inner, ""),
    };
    if !is_ident(id) {
        return None;
    }
    let metadata = rest
        .strip_prefix("meta=\"")
        .and_then(|r| r.strip_suffix('"'))
        .map(|m| html_escape::decode_html_entities(m).into_owned());
    if !rest.is_empty() && metadata.is_none() {
        return None;
    }
    Some((trimmed[..open].trim_end(), id, metadata))
}
