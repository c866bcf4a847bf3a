//! Collaborator contracts: traceable subjects and authors
//!
//! Domain entities implement [`Traceable`] to emit audit events about
//! themselves. The core reads them through a JSON snapshot, so display
//! names and detail mappings are plain path lookups or closures over
//! that snapshot.

use crate::error::{AuditError, Result};
use crate::event_type::EventType;
use crate::merge::get_path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Default subject field used as display name
pub const DEFAULT_DISPLAY_PROPERTY: &str = "name";

/// A domain entity that can emit audit events about itself
pub trait Traceable: Send + Sync {
    /// Entity kind, recorded as `objectType` (e.g., "Employee")
    fn entity_kind(&self) -> &str;

    /// Opaque identifier of this object, recorded as `objectId`
    fn object_id(&self) -> String;

    /// JSON view of the object's fields
    ///
    /// Usually `serde_json::to_value(self)`; must be an object.
    fn snapshot(&self) -> Result<Value>;

    /// Display name read from `property` of the snapshot
    ///
    /// Strings are used as-is, numbers and booleans by their text form.
    fn display_name(&self, snapshot: &Value, property: &str) -> Result<String> {
        match get_path(snapshot, property) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
            Some(other) => Err(AuditError::unresolved(
                self.entity_kind(),
                format!("display property '{}' is not a scalar: {}", property, other),
            )),
            None => Err(AuditError::unresolved(
                self.entity_kind(),
                format!("display property '{}' is missing", property),
            )),
        }
    }

    /// Detail values this object contributes to an event of `event_type`
    ///
    /// Defaults to the type's schema mappings (`mapFrom`). Implementors may
    /// extend or replace them; failures surface as `UnresolvedSubject`.
    fn declared_detail_mappings(
        &self,
        event_type: &EventType,
        snapshot: &Value,
    ) -> Result<Map<String, Value>> {
        Ok(event_type.mapped_details(snapshot))
    }
}

/// Something that can author an event (usually a user)
pub trait Author {
    /// Identifier recorded as `authorId`
    fn author_id(&self) -> String;
}

/// Identifier of the user who triggered an event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    /// Identifier of any `Author`
    pub fn of(author: &dyn Author) -> Self {
        Self(author.author_id())
    }

    /// Identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw identifier
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AuthorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Snapshot a subject and check it is a JSON object
pub(crate) fn object_snapshot(subject: &dyn Traceable) -> Result<Value> {
    let snapshot = subject.snapshot().map_err(|e| match e {
        AuditError::UnresolvedSubject { .. } => e,
        other => AuditError::unresolved(subject.entity_kind(), other.to_string()),
    })?;
    if !snapshot.is_object() {
        return Err(AuditError::unresolved(
            subject.entity_kind(),
            "snapshot is not a JSON object",
        ));
    }
    Ok(snapshot)
}
