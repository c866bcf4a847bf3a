//! Core audit types for the a3s-audit system
//!
//! All types use camelCase JSON serialization, which is also the view
//! message templates are rendered against (`%(objectName)s`).

use crate::error::Result;
use crate::event_type::{EventType, CREATE, REMOVE, UPDATE};
use crate::merge::merge_maps;
use crate::subject::AuthorId;
use crate::template::MessageCompiler;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One audit event about one subject object
///
/// Built transiently, finalized (message compiled) right before
/// persistence, then handed to the sink which assigns `id` and
/// `createdAt`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Sink-assigned identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Subject entity kind (e.g., "Employee")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    /// Subject identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// Subject display name snapshotted at build time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,

    /// Resolved event type name
    #[serde(rename = "type")]
    pub event_type: String,

    /// User who triggered the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,

    /// Event details
    #[serde(default)]
    pub details: Map<String, Value>,

    /// printf-style template the message is compiled from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,

    /// Compiled message; unset when no template is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Sink-assigned creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Resolved type definition; absent on records loaded from storage
    #[serde(skip)]
    pub(crate) type_spec: Option<Arc<EventType>>,
}

impl AuditRecord {
    /// Create an empty record of `event_type`
    ///
    /// Details are seeded with the type defaults and the message template
    /// is taken from the type.
    pub fn of_type(event_type: Arc<EventType>) -> Self {
        Self {
            event_type: event_type.name().to_string(),
            details: event_type.default_details(),
            message_template: event_type.message_template().map(str::to_string),
            type_spec: Some(event_type),
            ..Default::default()
        }
    }

    /// Resolved type definition
    pub fn type_spec(&self) -> Option<&Arc<EventType>> {
        self.type_spec.as_ref()
    }

    /// Set the subject reference and display name
    pub fn set_object(
        &mut self,
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        object_name: impl Into<String>,
    ) {
        self.object_type = Some(object_type.into());
        self.object_id = Some(object_id.into());
        self.object_name = Some(object_name.into());
    }

    /// Set the author
    pub fn set_author(&mut self, author: AuthorId) {
        self.author_id = Some(author);
    }

    /// Replace the message template
    pub fn set_message_template(&mut self, template: impl Into<String>) {
        self.message_template = Some(template.into());
    }

    /// Deep-merge `details` over the current details
    pub fn extend_details(&mut self, details: &Map<String, Value>) {
        merge_maps(&mut self.details, details);
    }

    /// Whether the record may be persisted: its type is enabled
    ///
    /// Records without a resolved type (e.g., loaded from storage) count
    /// as registrable.
    pub fn is_registrable(&self) -> bool {
        self.type_spec.as_ref().map_or(true, |t| t.is_enabled())
    }

    /// Check required details against the type schema (advisory)
    pub fn validate(&self) -> Result<()> {
        match &self.type_spec {
            Some(t) => t.validate(&self.details),
            None => Ok(()),
        }
    }

    /// Compile `message` from `messageTemplate`
    ///
    /// Leaves `message` untouched when there is no template; any rendering
    /// failure yields an empty message.
    pub fn compile_message(&mut self) {
        let template = match self.message_template.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return,
        };
        let message = match serde_json::to_value(&*self) {
            Ok(fields) => MessageCompiler::compile(&template, &fields),
            Err(e) => {
                tracing::debug!(error = %e, "Record could not be viewed as JSON");
                String::new()
            }
        };
        self.message = Some(message);
    }
}

/// Type reference inside a partial record
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// Type name, resolved through entity overrides then the registry
    Name(String),
    /// Already resolved type
    Type(Arc<EventType>),
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Arc<EventType>> for TypeRef {
    fn from(event_type: Arc<EventType>) -> Self {
        Self::Type(event_type)
    }
}

/// Loosely specified record: a type plus optional overrides
#[derive(Debug, Clone)]
pub struct PartialRecord {
    /// Event type
    pub event_type: TypeRef,

    /// Message template overriding the type's
    pub message: Option<String>,

    /// Explicit details; highest merge priority
    pub details: Map<String, Value>,

    /// Author, used when none is passed to build/trace
    pub author: Option<AuthorId>,
}

impl PartialRecord {
    /// Partial record of `event_type` with nothing else set
    pub fn new(event_type: impl Into<TypeRef>) -> Self {
        Self {
            event_type: event_type.into(),
            message: None,
            details: Map::new(),
            author: None,
        }
    }

    /// Set the message template
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    /// Set one explicit detail (top-level key)
    pub fn detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// Merge a JSON object into the explicit details; non-objects are ignored
    pub fn details(mut self, details: Value) -> Self {
        if let Value::Object(map) = details {
            merge_maps(&mut self.details, &map);
        }
        self
    }

    /// Set the author
    pub fn author(mut self, author: impl Into<AuthorId>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// What to trace: a finished record, a type, a type name, or a partial record
#[derive(Debug, Clone)]
pub enum EventRequest {
    /// Passed through unchanged
    Record(AuditRecord),
    /// Type name
    ByName(String),
    /// Resolved type
    ByType(Arc<EventType>),
    /// Type plus message/details/author overrides
    Partial(PartialRecord),
}

impl From<AuditRecord> for EventRequest {
    fn from(record: AuditRecord) -> Self {
        Self::Record(record)
    }
}

impl From<&str> for EventRequest {
    fn from(name: &str) -> Self {
        Self::ByName(name.to_string())
    }
}

impl From<String> for EventRequest {
    fn from(name: String) -> Self {
        Self::ByName(name)
    }
}

impl From<Arc<EventType>> for EventRequest {
    fn from(event_type: Arc<EventType>) -> Self {
        Self::ByType(event_type)
    }
}

impl From<EventType> for EventRequest {
    fn from(event_type: EventType) -> Self {
        Self::ByType(Arc::new(event_type))
    }
}

impl From<PartialRecord> for EventRequest {
    fn from(partial: PartialRecord) -> Self {
        Self::Partial(partial)
    }
}

/// Result of a trace request
#[derive(Debug, Clone)]
pub enum TraceOutcome {
    /// Record persisted by the sink
    Traced(AuditRecord),
    /// Type disabled; nothing persisted
    Skipped {
        /// Resolved type name
        event_type: String,
    },
}

impl TraceOutcome {
    /// Persisted record, if any
    pub fn record(&self) -> Option<&AuditRecord> {
        match self {
            Self::Traced(record) => Some(record),
            Self::Skipped { .. } => None,
        }
    }

    /// Consume into the persisted record, if any
    pub fn into_record(self) -> Option<AuditRecord> {
        match self {
            Self::Traced(record) => Some(record),
            Self::Skipped { .. } => None,
        }
    }

    /// Whether the type was disabled and nothing was persisted
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Standard lifecycle changes of a traceable object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// First save of a new instance
    Created,
    /// Save of an existing instance
    Updated,
    /// Deletion
    Removed,
}

impl Lifecycle {
    /// Created for a new instance, updated otherwise
    pub fn from_save(is_new: bool) -> Self {
        if is_new {
            Self::Created
        } else {
            Self::Updated
        }
    }

    /// Built-in event type name for this change
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Created => CREATE,
            Self::Updated => UPDATE,
            Self::Removed => REMOVE,
        }
    }
}
