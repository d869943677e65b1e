use serde::{Deserialize, Serialize};

/// Which facet of its target a documentation block describes.
///
/// The enum order is the canonical emission order for multiple blocks
/// attached to the same target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocTag {
    Description,
    Instructions,
    Notes,
    Examples,
    Documentation,
}

impl DocTag {
    pub fn as_str(self) -> &'static str {
        match self {
            DocTag::Description => "description",
            DocTag::Instructions => "instructions",
            DocTag::Notes => "notes",
            DocTag::Examples => "examples",
            DocTag::Documentation => "documentation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "description" => Some(DocTag::Description),
            "instructions" => Some(DocTag::Instructions),
            "notes" => Some(DocTag::Notes),
            "examples" => Some(DocTag::Examples),
            "documentation" => Some(DocTag::Documentation),
            _ => None,
        }
    }
}

/// A documentation block attached to a form, group, field, or (via the
/// qualified `"field.option"` form) an option. Identified by the unique
/// `(ref, tag)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentationBlock {
    #[serde(rename = "ref")]
    pub target: String,
    pub tag: DocTag,
    /// Verbatim Markdown body, never reformatted.
    pub body: String,
}

/// Answer-state a note is linked to, for skip/abort audit trails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteState {
    Skipped,
    Aborted,
}

impl NoteState {
    pub fn as_str(self) -> &'static str {
        match self {
            NoteState::Skipped => "skipped",
            NoteState::Aborted => "aborted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "skipped" => Some(NoteState::Skipped),
            "aborted" => Some(NoteState::Aborted),
            _ => None,
        }
    }
}

/// Free-form annotation on a form element. Notes are metadata, not form
/// data: many notes may target one element, and a note may link to the
/// skip/abort action that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(rename = "ref")]
    pub target: String,
    pub role: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<NoteState>,
}
