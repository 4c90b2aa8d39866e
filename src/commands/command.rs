use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{DomainId, NamedId};
use crate::snapshot::EtagVersion;
use crate::state::{ContentData, Status};

/// Where a command keeps the schema it is about.
pub enum SchemaSlot<'a> {
    /// Commands that reference a schema by named id (content commands).
    Reference(&'a mut Option<NamedId>),
    /// Commands whose target is the schema itself.
    Target(&'a mut Option<DomainId>),
}

impl SchemaSlot<'_> {
    pub fn is_filled(&self) -> bool {
        match self {
            SchemaSlot::Reference(slot) => slot.is_some(),
            SchemaSlot::Target(slot) => slot.as_ref().is_some_and(|id| !id.is_empty()),
        }
    }

    pub fn fill(self, schema: NamedId) {
        match self {
            SchemaSlot::Reference(slot) => *slot = Some(schema),
            SchemaSlot::Target(slot) => *slot = Some(schema.id),
        }
    }
}

/// A write command travelling through the pipeline.
pub trait Command: Any + Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// The tenant named by the command itself, if any.
    fn app_id(&self) -> Option<&NamedId> {
        None
    }

    /// The schema slot, for commands that carry one.
    fn schema_slot(&mut self) -> Option<SchemaSlot<'_>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkUpdateType {
    Upsert,
    ChangeStatus,
    Delete,
    Validate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateJob {
    #[serde(rename = "type")]
    pub job_type: BulkUpdateType,
    #[serde(default)]
    pub id: Option<DomainId>,
    #[serde(default)]
    pub data: Option<ContentData>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default = "any_version")]
    pub expected_version: i64,
}

fn any_version() -> i64 {
    EtagVersion::ANY
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateContents {
    #[serde(default)]
    pub app_id: Option<NamedId>,
    #[serde(default)]
    pub schema_id: Option<NamedId>,
    #[serde(default)]
    pub publish: bool,
    #[serde(default)]
    pub do_not_validate: bool,
    #[serde(default)]
    pub do_not_script: bool,
    #[serde(default)]
    pub optimize_validation: bool,
    #[serde(default)]
    pub jobs: Option<Vec<BulkUpdateJob>>,
}

impl Command for BulkUpdateContents {
    fn name(&self) -> &'static str {
        "content.bulkUpdate"
    }

    fn app_id(&self) -> Option<&NamedId> {
        self.app_id.as_ref()
    }

    fn schema_slot(&mut self) -> Option<SchemaSlot<'_>> {
        Some(SchemaSlot::Reference(&mut self.schema_id))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContent {
    #[serde(default)]
    pub app_id: Option<NamedId>,
    #[serde(default)]
    pub schema_id: Option<NamedId>,
    #[serde(default = "DomainId::new_guid")]
    pub content_id: DomainId,
    #[serde(default)]
    pub data: ContentData,
    #[serde(default)]
    pub publish: bool,
}

impl CreateContent {
    pub fn new(data: ContentData) -> Self {
        Self {
            app_id: None,
            schema_id: None,
            content_id: DomainId::new_guid(),
            data,
            publish: false,
        }
    }
}

impl Command for CreateContent {
    fn name(&self) -> &'static str {
        "content.create"
    }

    fn app_id(&self) -> Option<&NamedId> {
        self.app_id.as_ref()
    }

    fn schema_slot(&mut self) -> Option<SchemaSlot<'_>> {
        Some(SchemaSlot::Reference(&mut self.schema_id))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Publishes the schema it targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSchema {
    #[serde(default)]
    pub app_id: Option<NamedId>,
    #[serde(default)]
    pub schema_id: Option<DomainId>,
}

impl Command for PublishSchema {
    fn name(&self) -> &'static str {
        "schema.publish"
    }

    fn app_id(&self) -> Option<&NamedId> {
        self.app_id.as_ref()
    }

    fn schema_slot(&mut self) -> Option<SchemaSlot<'_>> {
        Some(SchemaSlot::Target(&mut self.schema_id))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
