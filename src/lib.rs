//! # a3s-audit
//!
//! Typed, configurable audit trails for traceable domain entities.
//!
//! ## Overview
//!
//! `a3s-audit` lets domain entities emit human-readable audit events when
//! they are created, changed, removed, or go through a custom domain action
//! ("hired", "population changed"). Each event carries a message rendered
//! from a template, a structured details payload, and references to the
//! object and the user that triggered it.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_audit::{AuditService, MemorySink, Result, Traceable, TraceabilityConfig};
//! use serde_json::{json, Value};
//!
//! struct Employee {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Traceable for Employee {
//!     fn entity_kind(&self) -> &str {
//!         "Employee"
//!     }
//!
//!     fn object_id(&self) -> String {
//!         self.id.to_string()
//!     }
//!
//!     fn snapshot(&self) -> Result<Value> {
//!         Ok(json!({"id": self.id, "name": self.name}))
//!     }
//! }
//!
//! # async fn example() -> a3s_audit::Result<()> {
//! let service = AuditService::from_config(TraceabilityConfig::default(), MemorySink::default())?;
//!
//! let john = Employee { id: 1, name: "John Doe".to_string() };
//! let outcome = service.trace("create", Some("u-1".into()), Some(&john)).await?;
//!
//! if let Some(record) = outcome.record() {
//!     println!("{}", record.message.as_deref().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **EventTypeRegistry** — global pool of named event types
//! - **EntityEventOverrides** — per-entity-kind pool shadowing the registry
//! - **AuditRecordBuilder** — resolves a request into an unsaved record
//! - **MessageCompiler** — printf-style named placeholder rendering
//! - **AuditService** — `build` and `trace` façade over a pluggable
//!   **AuditSink**

pub mod builder;
pub mod config;
pub mod error;
pub mod event_type;
pub mod merge;
pub mod overrides;
pub mod registry;
pub mod service;
pub mod sink;
pub mod subject;
pub mod template;
pub mod types;

// Re-export core types
pub use builder::AuditRecordBuilder;
pub use config::{EntityConfig, TraceabilityConfig};
pub use error::{AuditError, Result};
pub use event_type::{DetailField, EventType, EventTypeOptions, MapFrom, TypeOptions};
pub use overrides::{EntityEventOverrides, OverrideCatalog};
pub use registry::EventTypeRegistry;
pub use service::AuditService;
pub use sink::AuditSink;
pub use subject::{Author, AuthorId, Traceable};
pub use template::{MessageCompiler, TemplateCompilationError};
pub use types::{AuditRecord, EventRequest, Lifecycle, PartialRecord, TraceOutcome, TypeRef};

// Re-export sinks for convenience
pub use sink::memory::{MemorySink, MemorySinkConfig};
