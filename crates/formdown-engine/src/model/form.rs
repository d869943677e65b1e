use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::annotations::{DocumentationBlock, Note};
use super::response::FieldResponse;
use super::schema::{Field, FieldGroup, FormSchema};

/// What kind of structural node an ID refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Form,
    Group,
    Field,
}

/// One entry in the global structural-ID index.
///
/// Options are deliberately absent: option IDs are field-scoped and resolved
/// through the owning field, never globally.
#[derive(Debug, Clone, PartialEq)]
pub struct IdEntry {
    pub node: NodeKind,
    pub parent: Option<String>,
}

/// The metadata block at the top of a `.form.md` file.
///
/// `extra` preserves caller keys in first-seen order; the engine-owned
/// `summary` key is stripped on parse and recomputed on every serialize.
#[derive(Debug, Clone, PartialEq)]
pub struct FormMetadata {
    /// Value of the `formdown` spec-version marker.
    pub version: u32,
    pub extra: serde_yaml::Mapping,
}

impl FormMetadata {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            extra: serde_yaml::Mapping::new(),
        }
    }
}

/// The in-memory unit of work: schema, responses, annotations, and the two
/// lookup indexes. Created once by the parser, mutated only through the
/// patch engine, consumed by the serializer and summary engine. The
/// canonical text is the only persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedForm {
    pub schema: FormSchema,
    pub responses: BTreeMap<String, FieldResponse>,
    pub notes: Vec<Note>,
    pub docs: Vec<DocumentationBlock>,
    /// Structural IDs in first-seen document order.
    pub order_index: Vec<String>,
    /// Global ID → node kind + parent, for O(1) validation lookups.
    pub id_index: HashMap<String, IdEntry>,
    pub metadata: FormMetadata,
}

impl ParsedForm {
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.schema.field(field_id)
    }

    pub fn field_with_group(&self, field_id: &str) -> Option<(&FieldGroup, &Field)> {
        self.schema.field_with_group(field_id)
    }

    pub fn response(&self, field_id: &str) -> Option<&FieldResponse> {
        self.responses.get(field_id)
    }

    /// Fields in document order, paired with their responses.
    ///
    /// Every field has a response entry by construction; the expect is an
    /// internal invariant, not caller input.
    pub fn fields_with_responses(&self) -> impl Iterator<Item = (&Field, &FieldResponse)> {
        self.schema.fields().map(|f| {
            let response = self
                .responses
                .get(&f.id)
                .expect("every field has a response entry");
            (f, response)
        })
    }

    /// Resolve a reference against the ID index, accepting the qualified
    /// `"field_id.option_id"` form for options.
    pub fn resolve_ref(&self, target: &str) -> bool {
        if self.id_index.contains_key(target) {
            return true;
        }
        if let Some((field_id, option_id)) = target.split_once('.')
            && let Some(field) = self.field(field_id)
        {
            return field.kind.option(option_id).is_some();
        }
        false
    }
}
