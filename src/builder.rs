//! Audit record construction
//!
//! Turns an [`EventRequest`] plus an optional subject and author into a
//! fully populated, unsaved [`AuditRecord`]. Details are layered low to
//! high: type defaults, subject mappings, explicit request details.
//! No persistence happens here and no schema validation either.

use crate::error::{AuditError, Result};
use crate::event_type::EventType;
use crate::overrides::OverrideCatalog;
use crate::registry::EventTypeRegistry;
use crate::subject::{object_snapshot, AuthorId, Traceable, DEFAULT_DISPLAY_PROPERTY};
use crate::types::{AuditRecord, EventRequest, TypeRef};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Builds audit records against a registry and its entity overrides
pub struct AuditRecordBuilder<'a> {
    registry: &'a EventTypeRegistry,
    overrides: &'a OverrideCatalog,
    display_property: &'a str,
}

impl<'a> AuditRecordBuilder<'a> {
    /// Create a builder reading types from `registry` and `overrides`
    pub fn new(registry: &'a EventTypeRegistry, overrides: &'a OverrideCatalog) -> Self {
        Self {
            registry,
            overrides,
            display_property: DEFAULT_DISPLAY_PROPERTY,
        }
    }

    /// Subject field used as display name when the entity kind sets none
    pub fn display_property(mut self, property: &'a str) -> Self {
        self.display_property = property;
        self
    }

    /// Build a record without persisting it
    ///
    /// An existing record is returned unchanged. An empty type name is
    /// treated as a missing request.
    pub fn build(
        &self,
        request: EventRequest,
        author: Option<AuthorId>,
        subject: Option<&dyn Traceable>,
    ) -> Result<AuditRecord> {
        let (event_type, message, details, request_author) = match request {
            EventRequest::Record(record) => return Ok(record),
            EventRequest::ByName(name) => (self.resolve(&name, subject)?, None, Map::new(), None),
            EventRequest::ByType(event_type) => {
                (named(event_type)?, None, Map::new(), None)
            }
            EventRequest::Partial(partial) => {
                let event_type = match partial.event_type {
                    TypeRef::Name(name) => self.resolve(&name, subject)?,
                    TypeRef::Type(event_type) => named(event_type)?,
                };
                (event_type, partial.message, partial.details, partial.author)
            }
        };

        let mut record = AuditRecord::of_type(Arc::clone(&event_type));

        if let Some(subject) = subject {
            self.apply_subject(&mut record, &event_type, subject)?;
        }

        record.extend_details(&details);

        if let Some(author) = author.or(request_author) {
            record.set_author(author);
        }
        if let Some(message) = message {
            record.set_message_template(message);
        }

        tracing::trace!(
            event_type = %record.event_type,
            object_type = ?record.object_type,
            "Audit record built"
        );
        Ok(record)
    }

    /// Resolve a type name, consulting the subject's entity overrides first
    fn resolve(&self, name: &str, subject: Option<&dyn Traceable>) -> Result<Arc<EventType>> {
        if name.is_empty() {
            return Err(AuditError::MissingEvent);
        }
        match subject {
            Some(subject) => self
                .overrides
                .resolve(self.registry, subject.entity_kind(), name),
            None => self.registry.get_or_default(name),
        }
    }

    /// Snapshot object reference and display name, then merge subject mappings
    fn apply_subject(
        &self,
        record: &mut AuditRecord,
        event_type: &EventType,
        subject: &dyn Traceable,
    ) -> Result<()> {
        let kind = subject.entity_kind();
        let snapshot: Value = object_snapshot(subject)?;

        let configured = match self.overrides.pool(kind)? {
            Some(pool) => pool.display_property()?,
            None => None,
        };
        let property = configured.unwrap_or_else(|| self.display_property.to_string());
        let object_name = subject.display_name(&snapshot, &property)?;
        record.set_object(kind, subject.object_id(), object_name);

        let mapped = subject.declared_detail_mappings(event_type, &snapshot)?;
        record.extend_details(&mapped);
        Ok(())
    }
}

fn named(event_type: Arc<EventType>) -> Result<Arc<EventType>> {
    if event_type.name().is_empty() {
        return Err(AuditError::MissingEvent);
    }
    Ok(event_type)
}
