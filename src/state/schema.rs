use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AggregateState;
use crate::id::{DomainId, NamedId};

/// Snapshot of a content schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaState {
    pub id: DomainId,
    pub app_id: NamedId,
    /// Names are unique among live schemas only; a deleted schema's name can be reused.
    pub name: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub schema_def: SchemaDef,
    pub last_modified: DateTime<Utc>,
}

impl SchemaState {
    pub fn new(id: DomainId, app_id: NamedId, name: impl Into<String>) -> Self {
        Self {
            id,
            app_id,
            name: name.into(),
            is_published: false,
            is_deleted: false,
            schema_def: SchemaDef::default(),
            last_modified: Utc::now(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldDef>) -> Self {
        self.schema_def = SchemaDef { fields };
        self
    }

    pub fn named_id(&self) -> NamedId {
        NamedId::new(self.id.clone(), self.name.clone())
    }
}

impl AggregateState for SchemaState {
    const KIND: &'static str = "schema";

    fn id(&self) -> &DomainId {
        &self.id
    }

    fn app_id(&self) -> &DomainId {
        &self.app_id.id
    }

    fn schema_id(&self) -> Option<&DomainId> {
        Some(&self.id)
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }
}

/// Field definitions of a schema, consulted when adjusting filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub fields: Vec<FieldDef>,
}

impl SchemaDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(id: u64, name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }
}

/// Declared value type of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    Number,
    String,
    Boolean,
    DateTime,
    Enum { allowed: Vec<String> },
    References,
    Json,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::DateTime => "datetime",
            FieldKind::Enum { .. } => "enum",
            FieldKind::References => "references",
            FieldKind::Json => "json",
        }
    }
}
