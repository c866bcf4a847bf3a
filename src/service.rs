//! High-level audit service
//!
//! `AuditService` ties the type registry, per-entity override pools and a
//! persistence sink together. `build` is pure; `trace` builds, checks that
//! the type is enabled, compiles the message and makes exactly one sink
//! call.
//!
//! Registration (`register_type`, `configure_entity`, `override_type`) is
//! meant for startup. It is safe afterwards too: pools are guarded by
//! locks and types are replaced atomically.

use crate::builder::AuditRecordBuilder;
use crate::config::{EntityConfig, TraceabilityConfig};
use crate::error::Result;
use crate::event_type::{EventType, TypeOptions};
use crate::overrides::{EntityEventOverrides, OverrideCatalog};
use crate::registry::EventTypeRegistry;
use crate::sink::AuditSink;
use crate::subject::{AuthorId, Traceable};
use crate::types::{AuditRecord, EventRequest, Lifecycle, TraceOutcome};
use std::sync::Arc;

/// Audit façade used by entity code
pub struct AuditService {
    registry: Arc<EventTypeRegistry>,
    overrides: Arc<OverrideCatalog>,
    sink: Box<dyn AuditSink>,
    display_property: String,
}

impl AuditService {
    /// Create a service with an empty registry
    pub fn new(sink: impl AuditSink + 'static) -> Self {
        Self::with_registry(
            Arc::new(EventTypeRegistry::new()),
            Arc::new(OverrideCatalog::new()),
            sink,
        )
    }

    /// Create a service over existing registry and override pools
    pub fn with_registry(
        registry: Arc<EventTypeRegistry>,
        overrides: Arc<OverrideCatalog>,
        sink: impl AuditSink + 'static,
    ) -> Self {
        Self {
            registry,
            overrides,
            sink: Box::new(sink),
            display_property: TraceabilityConfig::default().display_property,
        }
    }

    /// Create a service and apply `config`: global types first, then entities
    pub fn from_config(config: TraceabilityConfig, sink: impl AuditSink + 'static) -> Result<Self> {
        let mut service = Self::new(sink);
        service.display_property = config.display_property;

        for (name, options) in config.events {
            service.registry.register(&name, options)?;
        }
        for (kind, entity) in config.entities {
            service.configure_entity(&kind, entity)?;
        }

        tracing::debug!(
            sink = service.sink.name(),
            types = service.registry.len()?,
            "Audit service configured"
        );
        Ok(service)
    }

    /// Global type registry
    pub fn registry(&self) -> &EventTypeRegistry {
        &self.registry
    }

    /// Per-entity override pools
    pub fn overrides(&self) -> &OverrideCatalog {
        &self.overrides
    }

    /// Sink name
    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Register a global event type
    pub fn register_type(&self, name: &str, options: impl Into<TypeOptions>) -> Result<Arc<EventType>> {
        self.registry.register(name, options)
    }

    /// Apply an entity kind's configuration, creating its pool if needed
    pub fn configure_entity(&self, kind: &str, entity: EntityConfig) -> Result<Arc<EntityEventOverrides>> {
        let pool = self.overrides.get_or_create(kind)?;
        if let Some(property) = entity.display_property {
            pool.set_display_property(property)?;
        }
        for (name, options) in entity.events {
            pool.override_type(&self.registry, &name, options)?;
        }
        Ok(pool)
    }

    /// Override one event type for an entity kind
    pub fn override_type(
        &self,
        kind: &str,
        name: &str,
        options: impl Into<TypeOptions>,
    ) -> Result<Arc<EventType>> {
        self.overrides
            .get_or_create(kind)?
            .override_type(&self.registry, name, options)
    }

    /// Type `name` as seen by entity `kind`: local override, else global
    ///
    /// `None` when neither declares it.
    pub fn event_type_for(&self, kind: &str, name: &str) -> Result<Option<Arc<EventType>>> {
        match self.overrides.pool(kind)? {
            Some(pool) => pool.lookup(&self.registry, name),
            None => self.registry.get(name),
        }
    }

    /// Build a record without persisting it
    pub fn build(
        &self,
        request: impl Into<EventRequest>,
        author: Option<AuthorId>,
        subject: Option<&dyn Traceable>,
    ) -> Result<AuditRecord> {
        AuditRecordBuilder::new(&self.registry, &self.overrides)
            .display_property(&self.display_property)
            .build(request.into(), author, subject)
    }

    /// Build, check registrability, compile and persist a record
    ///
    /// A disabled type yields `TraceOutcome::Skipped` without touching the
    /// sink. Sink failures are returned as-is.
    pub async fn trace(
        &self,
        request: impl Into<EventRequest>,
        author: Option<AuthorId>,
        subject: Option<&dyn Traceable>,
    ) -> Result<TraceOutcome> {
        let mut record = self.build(request, author, subject)?;

        if !record.is_registrable() {
            tracing::debug!(
                event_type = %record.event_type,
                object_type = ?record.object_type,
                "Audit event skipped, type disabled"
            );
            return Ok(TraceOutcome::Skipped {
                event_type: record.event_type,
            });
        }

        if let Err(e) = record.validate() {
            tracing::warn!(
                event_type = %record.event_type,
                error = %e,
                "Audit record details incomplete"
            );
        }

        record.compile_message();
        let record = self.sink.save(record).await?;

        tracing::info!(
            event_type = %record.event_type,
            object_type = ?record.object_type,
            object_name = ?record.object_name,
            id = ?record.id,
            "Audit event traced"
        );
        Ok(TraceOutcome::Traced(record))
    }

    /// Trace a built-in lifecycle event for `subject`
    pub async fn trace_lifecycle(
        &self,
        change: Lifecycle,
        author: Option<AuthorId>,
        subject: &dyn Traceable,
    ) -> Result<TraceOutcome> {
        self.trace(change.type_name(), author, Some(subject)).await
    }

    /// Records about `subject`, newest first
    pub async fn history(&self, subject: &dyn Traceable, limit: usize) -> Result<Vec<AuditRecord>> {
        self.sink
            .history(subject.entity_kind(), &subject.object_id(), limit)
            .await
    }
}
