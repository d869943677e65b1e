//! Tag/Token Extractor.
//!
//! Walks a pulldown-cmark offset-event stream and pulls out structural tags,
//! option list items, value fences, tables, and documentation/note blocks as
//! a flat, document-ordered entry list. Detection is scoped strictly to the
//! region between the opening and closing `form` marker; comment-like text
//! outside that region is never treated as syntax.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::error::{LineIndex, ParseError, ParseErrorKind};
use crate::model::{DocTag, DocumentationBlock, Note, NoteState};

use super::lexer::{self, LexedTag, RawTag, TagName};

/// Checkbox-style markers are matched over list-item text, not via native
/// task-list typing: the base AST has no concept of multi-state checkboxes.
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\[( |x|X|/|\*|-|y|n)\]\s*(.*)$").unwrap());

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--(.*?)-->").unwrap());

/// One extracted option list item, before kind/mode interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOption {
    pub marker: char,
    pub label: String,
    pub id: Option<String>,
    pub metadata: Option<String>,
    /// List nesting depth; anything beyond 1 is rejected by the builder.
    pub depth: usize,
    pub offset: usize,
}

/// Flat extractor output, in document order, with global byte offsets.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEntry {
    Open(RawTag),
    Close { name: TagName, offset: usize },
    Option(RawOption),
    Value { text: String, offset: usize },
    TableHead { cells: Vec<String>, offset: usize },
    TableRow { cells: Vec<String>, offset: usize },
    Doc { doc: DocumentationBlock, offset: usize },
    Note { note: Note, offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Region {
    Before,
    Active,
    After,
}

#[derive(Debug)]
struct ItemCapture {
    text: String,
    annotation: Option<(String, Option<String>)>,
    depth: usize,
    offset: usize,
}

#[derive(Debug)]
enum FenceState {
    None,
    /// A `value` fence whose content is being captured.
    Value { buf: String, offset: usize },
    /// Any other fence; content is plain Markdown, not ours.
    Skip,
}

/// A doc/note block whose close tag is still ahead; everything in between is
/// verbatim body.
struct PendingBlock {
    name: TagName,
    tag: RawTag,
    body_start: usize,
}

struct Extractor<'a> {
    body: &'a str,
    body_offset: usize,
    lines: &'a LineIndex,
    region: Region,
    entries: Vec<RawEntry>,
    pending: Option<PendingBlock>,
    items: Vec<ItemCapture>,
    list_depth: usize,
    fence: FenceState,
    in_table: bool,
    table_cells: Vec<String>,
    cell_buf: Option<String>,
}

pub fn extract_entries(
    body: &str,
    body_offset: usize,
    lines: &LineIndex,
) -> Result<Vec<RawEntry>, ParseError> {
    let mut extractor = Extractor {
        body,
        body_offset,
        lines,
        region: Region::Before,
        entries: Vec::new(),
        pending: None,
        items: Vec::new(),
        list_depth: 0,
        fence: FenceState::None,
        in_table: false,
        table_cells: Vec::new(),
        cell_buf: None,
    };
    extractor.run()?;
    Ok(extractor.entries)
}

impl<'a> Extractor<'a> {
    fn run(&mut self) -> Result<(), ParseError> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        let parser = Parser::new_ext(self.body, options);

        for (event, range) in parser.into_offset_iter() {
            let offset = self.body_offset + range.start;
            match event {
                Event::Start(Tag::HtmlBlock) => {
                    self.scan_comments(&self.body[range.clone()].to_string(), offset)?;
                }
                Event::InlineHtml(_) => {
                    self.scan_comments(&self.body[range.clone()].to_string(), offset)?;
                }
                Event::Start(Tag::Paragraph) if self.items.is_empty() => {
                    if self.region != Region::After {
                        self.scan_directives(&self.body[range.clone()].to_string(), offset)?;
                    }
                }
                _ if self.pending.is_some() => {
                    // Verbatim doc/note body; only a matching close comment
                    // (handled above) gets us out.
                }
                _ if self.region != Region::Active => {}
                Event::Start(Tag::List(_)) => {
                    self.list_depth += 1;
                }
                Event::End(TagEnd::List(_)) => {
                    self.list_depth = self.list_depth.saturating_sub(1);
                }
                Event::Start(Tag::Item) => {
                    self.items.push(ItemCapture {
                        text: String::new(),
                        annotation: None,
                        depth: self.list_depth,
                        offset,
                    });
                }
                Event::End(TagEnd::Item) => {
                    if let Some(item) = self.items.pop() {
                        self.finish_item(item);
                    }
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let is_value = matches!(
                        &kind,
                        CodeBlockKind::Fenced(info) if info.trim() == "value"
                    );
                    self.fence = if is_value && self.items.is_empty() && !self.in_table {
                        FenceState::Value {
                            buf: String::new(),
                            offset,
                        }
                    } else {
                        FenceState::Skip
                    };
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let FenceState::Value { mut buf, offset } =
                        std::mem::replace(&mut self.fence, FenceState::None)
                    {
                        if buf.ends_with('\n') {
                            buf.pop();
                        }
                        self.entries.push(RawEntry::Value { text: buf, offset });
                    }
                }
                Event::Start(Tag::Table(_)) => {
                    self.in_table = true;
                }
                Event::End(TagEnd::Table) => {
                    self.in_table = false;
                }
                Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => {
                    self.table_cells.clear();
                }
                Event::End(TagEnd::TableHead) => {
                    self.entries.push(RawEntry::TableHead {
                        cells: std::mem::take(&mut self.table_cells),
                        offset,
                    });
                }
                Event::End(TagEnd::TableRow) => {
                    self.entries.push(RawEntry::TableRow {
                        cells: std::mem::take(&mut self.table_cells),
                        offset,
                    });
                }
                Event::Start(Tag::TableCell) => {
                    self.cell_buf = Some(String::new());
                }
                Event::End(TagEnd::TableCell) => {
                    if let Some(cell) = self.cell_buf.take() {
                        self.table_cells.push(cell.trim().to_string());
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    self.push_text(&text);
                }
                Event::SoftBreak | Event::HardBreak => {
                    self.push_text(" ");
                }
                _ => {}
            }
        }

        match self.region {
            Region::Before => Err(ParseError::new(
                self.lines.pos(self.body_offset),
                ParseErrorKind::MissingFormTag,
            )),
            Region::Active => Err(ParseError::new(
                self.lines.pos(self.body_offset + self.body.len()),
                ParseErrorKind::UnclosedTag {
                    tag: match &self.pending {
                        Some(p) => p.name.as_str().to_string(),
                        None => "form".to_string(),
                    },
                },
            )),
            Region::After => Ok(()),
        }
    }

    fn push_text(&mut self, text: &str) {
        match &mut self.fence {
            FenceState::Value { buf, .. } => {
                buf.push_str(text);
                return;
            }
            FenceState::Skip => return,
            FenceState::None => {}
        }
        if let Some(cell) = &mut self.cell_buf {
            cell.push_str(text);
        } else if let Some(item) = self.items.last_mut() {
            item.text.push_str(text);
        }
    }

    /// Scan an HTML chunk for comments and dispatch each through the comment
    /// lexer. One chunk may hold several comments (open and close on one
    /// line), or a comment plus surrounding markup.
    fn scan_comments(&mut self, html: &str, chunk_offset: usize) -> Result<(), ParseError> {
        for caps in COMMENT_RE.captures_iter(html) {
            let whole = caps.get(0).unwrap();
            let inner = caps.get(1).unwrap().as_str();
            let offset = chunk_offset + whole.start();

            if let Some(pending_name) = self.pending.as_ref().map(|p| p.name) {
                let close = lexer::lex_comment(inner, offset, self.lines).unwrap_or(None);
                if let Some(LexedTag::Close { name, .. }) = close
                    && name == pending_name
                {
                    self.finish_pending(offset)?;
                }
                continue;
            }

            match self.region {
                Region::After => {}
                Region::Before => {
                    // Outside the form region only the opening form marker
                    // is syntax; everything else stays prose.
                    if inner.trim().starts_with("form")
                        && let Some(LexedTag::Open(tag)) =
                            lexer::lex_comment(inner, offset, self.lines)?
                        && tag.name == TagName::Form
                    {
                        self.region = Region::Active;
                        self.entries.push(RawEntry::Open(tag));
                    }
                }
                Region::Active => {
                    if let Some(lexed) = lexer::lex_comment(inner, offset, self.lines)? {
                        self.handle_lexed(lexed, whole.end() + chunk_offset)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Dispatch `::` directive lines from a paragraph through the directive
    /// lexer, honoring region transitions mid-paragraph.
    fn scan_directives(&mut self, slice: &str, chunk_offset: usize) -> Result<(), ParseError> {
        let mut line_offset = 0;
        for line in slice.split_inclusive('\n') {
            let offset = chunk_offset + line_offset;
            line_offset += line.len();
            let trimmed = line.trim_start();
            let offset = offset + (line.len() - trimmed.len());
            if !trimmed.starts_with("::") {
                continue;
            }
            if let Some(pending_name) = self.pending.as_ref().map(|p| p.name) {
                let close = lexer::lex_directive(trimmed, offset, self.lines).unwrap_or(None);
                if let Some(LexedTag::Close { name, .. }) = close
                    && name == pending_name
                {
                    self.finish_pending(offset)?;
                }
                continue;
            }
            match self.region {
                Region::After => {}
                Region::Before => {
                    if trimmed.starts_with("::form")
                        && let Some(LexedTag::Open(tag)) =
                            lexer::lex_directive(trimmed, offset, self.lines)?
                        && tag.name == TagName::Form
                    {
                        self.region = Region::Active;
                        self.entries.push(RawEntry::Open(tag));
                    }
                }
                Region::Active => {
                    if let Some(lexed) = lexer::lex_directive(trimmed, offset, self.lines)? {
                        let after = offset + trimmed.trim_end().len();
                        self.handle_lexed(lexed, after)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Shared handling of a lexed tag while the form region is active.
    /// `after_offset` points just past the tag, where a doc/note body starts.
    fn handle_lexed(&mut self, lexed: LexedTag, after_offset: usize) -> Result<(), ParseError> {
        match lexed {
            LexedTag::Open(tag) => match tag.name {
                TagName::Form => Err(ParseError::new(
                    self.lines.pos(tag.offset),
                    ParseErrorKind::MalformedTag {
                        tag: "form".to_string(),
                        message: "form tags cannot nest".to_string(),
                    },
                )),
                TagName::Doc | TagName::Note => {
                    self.pending = Some(PendingBlock {
                        name: tag.name,
                        tag,
                        body_start: after_offset,
                    });
                    Ok(())
                }
                TagName::Group | TagName::Field => {
                    self.entries.push(RawEntry::Open(tag));
                    Ok(())
                }
            },
            LexedTag::Close { name, offset } => match name {
                TagName::Form => {
                    self.entries.push(RawEntry::Close { name, offset });
                    self.region = Region::After;
                    Ok(())
                }
                TagName::Doc | TagName::Note => Err(ParseError::new(
                    self.lines.pos(offset),
                    ParseErrorKind::MalformedTag {
                        tag: name.as_str().to_string(),
                        message: "close tag without a matching open tag".to_string(),
                    },
                )),
                TagName::Group | TagName::Field => {
                    self.entries.push(RawEntry::Close { name, offset });
                    Ok(())
                }
            },
            LexedTag::OptionAnnotation { id, metadata, .. } => {
                if let Some(item) = self.items.last_mut() {
                    item.annotation = Some((id, metadata));
                }
                Ok(())
            }
        }
    }

    /// Turn a finished list item into an option entry if it carries a
    /// checkbox-style marker; otherwise it is ordinary prose.
    fn finish_item(&mut self, item: ItemCapture) {
        let text = item.text.trim();
        let Some(caps) = MARKER_RE.captures(text) else {
            return;
        };
        let marker = caps
            .get(1)
            .unwrap()
            .as_str()
            .chars()
            .next()
            .unwrap()
            .to_ascii_lowercase();
        let rest = caps.get(2).unwrap().as_str();

        let (label, id, metadata) = match item.annotation {
            Some((id, metadata)) => (rest.trim().to_string(), Some(id), metadata),
            None => match lexer::split_brace_annotation(rest) {
                Some((label, id, metadata)) => {
                    (label.to_string(), Some(id.to_string()), metadata)
                }
                None => (rest.trim().to_string(), None, None),
            },
        };

        self.entries.push(RawEntry::Option(RawOption {
            marker,
            label,
            id,
            metadata,
            depth: item.depth,
            offset: item.offset,
        }));
    }

    /// Close the pending doc/note block, slicing its verbatim body from raw
    /// source between the open and close tags.
    fn finish_pending(&mut self, close_offset: usize) -> Result<(), ParseError> {
        let pending = self.pending.take().expect("pending block present");
        let start = pending.body_start - self.body_offset;
        let end = (close_offset - self.body_offset).max(start);
        let body = trim_block_body(&self.body[start..end]);

        let tag = &pending.tag;
        let pos = self.lines.pos(tag.offset);
        match pending.name {
            TagName::Doc => {
                let mut target = None;
                let mut doc_tag = None;
                for (key, value) in &tag.attrs {
                    match key.as_str() {
                        "ref" => target = Some(value.clone()),
                        "tag" => {
                            doc_tag = Some(DocTag::from_str(value).ok_or_else(|| {
                                ParseError::new(
                                    pos,
                                    ParseErrorKind::MalformedTag {
                                        tag: "doc".to_string(),
                                        message: format!("unknown doc tag `{value}`"),
                                    },
                                )
                            })?);
                        }
                        other => {
                            return Err(ParseError::new(
                                pos,
                                ParseErrorKind::UnknownAttribute {
                                    tag: "doc".to_string(),
                                    attr: other.to_string(),
                                },
                            ));
                        }
                    }
                }
                let (Some(target), Some(doc_tag)) = (target, doc_tag) else {
                    return Err(ParseError::new(
                        pos,
                        ParseErrorKind::MalformedTag {
                            tag: "doc".to_string(),
                            message: "doc tags need both `ref` and `tag`".to_string(),
                        },
                    ));
                };
                self.entries.push(RawEntry::Doc {
                    doc: DocumentationBlock {
                        target,
                        tag: doc_tag,
                        body,
                    },
                    offset: tag.offset,
                });
            }
            TagName::Note => {
                let mut id = None;
                let mut target = None;
                let mut role = None;
                let mut state = None;
                for (key, value) in &tag.attrs {
                    match key.as_str() {
                        "id" => id = Some(value.clone()),
                        "ref" => target = Some(value.clone()),
                        "role" => role = Some(value.clone()),
                        "state" => {
                            state = Some(NoteState::from_str(value).ok_or_else(|| {
                                ParseError::new(
                                    pos,
                                    ParseErrorKind::MalformedTag {
                                        tag: "note".to_string(),
                                        message: format!("unknown note state `{value}`"),
                                    },
                                )
                            })?);
                        }
                        other => {
                            return Err(ParseError::new(
                                pos,
                                ParseErrorKind::UnknownAttribute {
                                    tag: "note".to_string(),
                                    attr: other.to_string(),
                                },
                            ));
                        }
                    }
                }
                let (Some(id), Some(target), Some(role)) = (id, target, role) else {
                    return Err(ParseError::new(
                        pos,
                        ParseErrorKind::MalformedTag {
                            tag: "note".to_string(),
                            message: "note tags need `id`, `ref`, and `role`".to_string(),
                        },
                    ));
                };
                self.entries.push(RawEntry::Note {
                    note: Note {
                        id,
                        target,
                        role,
                        text: body,
                        state,
                    },
                    offset: tag.offset,
                });
            }
            _ => unreachable!("only doc/note blocks are pending"),
        }
        Ok(())
    }
}

/// Strip the single newline adjoining each delimiter tag, keeping interior
/// blank lines intact. Single-line bodies are whitespace-trimmed instead.
fn trim_block_body(slice: &str) -> String {
    if !slice.contains('\n') {
        return slice.trim().to_string();
    }
    let mut s = slice;
    s = s.strip_prefix("\r\n").or_else(|| s.strip_prefix('\n')).unwrap_or(s);
    s = s.strip_suffix('\n').unwrap_or(s);
    s = s.strip_suffix('\r').unwrap_or(s);
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(body: &str) -> Result<Vec<RawEntry>, ParseError> {
        let lines = LineIndex::new(body);
        extract_entries(body, 0, &lines)
    }

    #[test]
    fn test_minimal_form_region() {
        let entries = extract("<!-- form id=\"f\" -->\n\n<!-- /form -->\n").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], RawEntry::Open(tag) if tag.name == TagName::Form));
        assert!(matches!(
            &entries[1],
            RawEntry::Close {
                name: TagName::Form,
                ..
            }
        ));
    }

    #[test]
    fn test_comments_outside_region_are_prose() {
        let body = "<!-- field id=\"x\" -->\n\n<!-- form id=\"f\" -->\n\n<!-- /form -->\n\n<!-- group id=\"g\" -->\n";
        let entries = extract(body).unwrap();
        // The stray field/group comments outside the region never surface.
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_missing_form_tag() {
        let err = extract("just prose\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::MissingFormTag));
    }

    #[test]
    fn test_unclosed_form_tag() {
        let err = extract("<!-- form id=\"f\" -->\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnclosedTag { .. }));
    }

    #[test]
    fn test_option_items_with_comment_annotations() {
        let body = "<!-- form id=\"f\" -->\n\n<!-- field id=\"docs\" kind=\"checkboxes\" label=\"Docs\" -->\n\n- [x] Annual report <!-- #annual -->\n- [ ] Tax filing <!-- #tax -->\n\n<!-- /field -->\n\n<!-- /form -->\n";
        let entries = extract(body).unwrap();
        let options: Vec<_> = entries
            .iter()
            .filter_map(|e| match e {
                RawEntry::Option(o) => Some(o),
                _ => None,
            })
            .collect();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].marker, 'x');
        assert_eq!(options[0].label, "Annual report");
        assert_eq!(options[0].id.as_deref(), Some("annual"));
        assert_eq!(options[1].marker, ' ');
        assert_eq!(options[1].id.as_deref(), Some("tax"));
    }

    #[test]
    fn test_option_items_with_brace_annotations() {
        let body = "::form{id=\"f\"}\n\n::field{id=\"docs\" kind=\"checkboxes\" label=\"Docs\"}\n\n- [/] Review {#review}\n\n::/field\n\n::/form\n";
        let entries = extract(body).unwrap();
        let options: Vec<_> = entries
            .iter()
            .filter_map(|e| match e {
                RawEntry::Option(o) => Some(o),
                _ => None,
            })
            .collect();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].marker, '/');
        assert_eq!(options[0].label, "Review");
        assert_eq!(options[0].id.as_deref(), Some("review"));
    }

    #[test]
    fn test_plain_list_items_are_prose() {
        let body = "<!-- form id=\"f\" -->\n\n- just a bullet\n- another one\n\n<!-- /form -->\n";
        let entries = extract(body).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_value_fence_capture() {
        let body = "<!-- form id=\"f\" -->\n\n<!-- field id=\"n\" kind=\"string\" label=\"N\" -->\n\n```value\nACME Corp\n```\n\n<!-- /field -->\n\n<!-- /form -->\n";
        let entries = extract(body).unwrap();
        let value = entries.iter().find_map(|e| match e {
            RawEntry::Value { text, .. } => Some(text.clone()),
            _ => None,
        });
        assert_eq!(value.as_deref(), Some("ACME Corp"));
    }

    #[test]
    fn test_non_value_fences_are_prose() {
        let body = "<!-- form id=\"f\" -->\n\n```rust\nfn main() {}\n```\n\n<!-- /form -->\n";
        let entries = extract(body).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_doc_block_body_is_verbatim() {
        let body = "<!-- form id=\"f\" -->\n\n<!-- doc ref=\"f\" tag=\"instructions\" -->\nFill *everything* in.\n\nEven this.\n<!-- /doc -->\n\n<!-- /form -->\n";
        let entries = extract(body).unwrap();
        let doc = entries
            .iter()
            .find_map(|e| match e {
                RawEntry::Doc { doc, .. } => Some(doc.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(doc.target, "f");
        assert_eq!(doc.tag, DocTag::Instructions);
        assert_eq!(doc.body, "Fill *everything* in.\n\nEven this.");
    }

    #[test]
    fn test_comment_lookalikes_inside_doc_body_stay_verbatim() {
        let body = "<!-- form id=\"f\" -->\n\n<!-- doc ref=\"f\" tag=\"notes\" -->\nA remark <!-- not syntax --> here.\n<!-- /doc -->\n\n<!-- /form -->\n";
        let entries = extract(body).unwrap();
        let doc = entries
            .iter()
            .find_map(|e| match e {
                RawEntry::Doc { doc, .. } => Some(doc.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(doc.body, "A remark <!-- not syntax --> here.");
    }

    #[test]
    fn test_note_block() {
        let body = "<!-- form id=\"f\" -->\n\n<!-- note id=\"n1\" ref=\"f\" role=\"agent\" state=\"skipped\" -->\nNo public filings exist.\n<!-- /note -->\n\n<!-- /form -->\n";
        let entries = extract(body).unwrap();
        let note = entries
            .iter()
            .find_map(|e| match e {
                RawEntry::Note { note, .. } => Some(note.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(note.id, "n1");
        assert_eq!(note.role, "agent");
        assert_eq!(note.state, Some(NoteState::Skipped));
        assert_eq!(note.text, "No public filings exist.");
    }

    #[test]
    fn test_table_rows() {
        let body = "<!-- form id=\"f\" -->\n\n<!-- field id=\"t\" kind=\"table\" label=\"T\" columns=\"name:text,amount:number\" -->\n\n| Name | Amount |\n| --- | --- |\n| Alpha | 100 |\n\n<!-- /field -->\n\n<!-- /form -->\n";
        let entries = extract(body).unwrap();
        let head = entries.iter().find_map(|e| match e {
            RawEntry::TableHead { cells, .. } => Some(cells.clone()),
            _ => None,
        });
        let row = entries.iter().find_map(|e| match e {
            RawEntry::TableRow { cells, .. } => Some(cells.clone()),
            _ => None,
        });
        assert_eq!(head, Some(vec!["Name".to_string(), "Amount".to_string()]));
        assert_eq!(row, Some(vec!["Alpha".to_string(), "100".to_string()]));
    }

    #[test]
    fn test_prose_headings_are_ignored() {
        let body = "<!-- form id=\"f\" title=\"T\" -->\n\n# T\n\nSome intro prose.\n\n<!-- /form -->\n";
        let entries = extract(body).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_nested_form_tag_is_an_error() {
        let body = "<!-- form id=\"f\" -->\n\n<!-- form id=\"g\" -->\n\n<!-- /form -->\n";
        let err = extract(body).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::MalformedTag { .. }));
    }
}
