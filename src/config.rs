//! Traceability configuration
//!
//! The configuration declares global event types and per-entity overrides.
//! Each event is either a flag or full options:
//!
//! ```json
//! {
//!   "displayProperty": "name",
//!   "events": {
//!     "hired": {
//!       "message": "%(objectName)s has been hired by %(details.companyName)s",
//!       "details": { "companyName": { "default": "an undefined company" } }
//!     }
//!   },
//!   "entities": {
//!     "Employee": { "events": { "remove": false } }
//!   }
//! }
//! ```
//!
//! The built-in `create`, `update` and `remove` types are enabled unless
//! the configuration says otherwise, globally and for every entity kind.

use crate::error::{AuditError, Result};
use crate::event_type::{TypeOptions, BUILTIN_TYPES};
use crate::subject::DEFAULT_DISPLAY_PROPERTY;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level traceability configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceabilityConfig {
    /// Subject field used as display name unless an entity overrides it
    #[serde(default = "default_display_property")]
    pub display_property: String,

    /// Global event types
    #[serde(default)]
    pub events: BTreeMap<String, TypeOptions>,

    /// Per-entity-kind configuration
    #[serde(default)]
    pub entities: BTreeMap<String, EntityConfig>,
}

/// Configuration of one traceable entity kind
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfig {
    /// Subject field used as display name for this kind
    #[serde(default)]
    pub display_property: Option<String>,

    /// Event overrides for this kind
    #[serde(default)]
    pub events: BTreeMap<String, TypeOptions>,
}

fn default_display_property() -> String {
    DEFAULT_DISPLAY_PROPERTY.to_string()
}

/// Enable every built-in type the map does not mention
fn with_builtin_events(events: &mut BTreeMap<String, TypeOptions>) {
    for name in BUILTIN_TYPES {
        events
            .entry(name.to_string())
            .or_insert(TypeOptions::Flag(true));
    }
}

impl Default for TraceabilityConfig {
    fn default() -> Self {
        let mut events = BTreeMap::new();
        with_builtin_events(&mut events);
        Self {
            display_property: default_display_property(),
            events,
            entities: BTreeMap::new(),
        }
    }
}

impl TraceabilityConfig {
    /// Default configuration: built-in types enabled, display property `name`
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AuditError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_json::from_str(&json).map_err(|e| {
            AuditError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            path = %path.display(),
            events = config.events.len(),
            entities = config.entities.len(),
            "Traceability config loaded"
        );
        Ok(config.normalized())
    }

    /// Declare a global event type
    pub fn event(mut self, name: impl Into<String>, options: impl Into<TypeOptions>) -> Self {
        self.events.insert(name.into(), options.into());
        self
    }

    /// Declare an entity kind
    pub fn entity(mut self, kind: impl Into<String>, entity: EntityConfig) -> Self {
        let mut entity = entity;
        with_builtin_events(&mut entity.events);
        self.entities.insert(kind.into(), entity);
        self
    }

    /// Fill in built-in type defaults globally and per entity
    fn normalized(mut self) -> Self {
        with_builtin_events(&mut self.events);
        for entity in self.entities.values_mut() {
            with_builtin_events(&mut entity.events);
        }
        self
    }
}

impl EntityConfig {
    /// Empty entity configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display property
    pub fn display_property(mut self, property: impl Into<String>) -> Self {
        self.display_property = Some(property.into());
        self
    }

    /// Declare an event override
    pub fn event(mut self, name: impl Into<String>, options: impl Into<TypeOptions>) -> Self {
        self.events.insert(name.into(), options.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_builtins() {
        let config = TraceabilityConfig::default();
        assert_eq!(config.display_property, "name");
        assert_eq!(config.events.len(), 3);
        assert!(matches!(config.events["create"], TypeOptions::Flag(true)));
        assert!(config.entities.is_empty());
    }

    #[test]
    fn test_from_json_merges_with_builtins() {
        let config = TraceabilityConfig::from_json(
            r#"{
                "events": {
                    "update": false,
                    "hired": {"message": "%(objectName)s hired"}
                },
                "entities": {
                    "Company": {"displayProperty": "title"},
                    "City": {"events": {"create": false}}
                }
            }"#,
        )
        .unwrap();

        assert!(matches!(config.events["update"], TypeOptions::Flag(false)));
        assert!(matches!(config.events["create"], TypeOptions::Flag(true)));
        assert!(matches!(config.events["hired"], TypeOptions::Options(_)));

        let company = &config.entities["Company"];
        assert_eq!(company.display_property.as_deref(), Some("title"));
        assert_eq!(company.events.len(), 3);
        assert!(matches!(config.entities["City"].events["create"], TypeOptions::Flag(false)));
    }

    #[test]
    fn test_from_json_invalid() {
        let err = TraceabilityConfig::from_json("{\"events\": 3}").unwrap_err();
        assert!(matches!(err, AuditError::Serialization(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = TraceabilityConfig::from_file("/nonexistent/a3s-audit.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/a3s-audit.json"));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("a3s-audit-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"displayProperty": "label"}"#).unwrap();

        let config = TraceabilityConfig::from_file(&path).unwrap();
        assert_eq!(config.display_property, "label");
        assert_eq!(config.events.len(), 3);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_builder_entity_gets_builtins() {
        let config = TraceabilityConfig::new()
            .event("hired", true)
            .entity("Employee", EntityConfig::new().event("remove", false));

        let employee = &config.entities["Employee"];
        assert!(matches!(employee.events["remove"], TypeOptions::Flag(false)));
        assert!(matches!(employee.events["create"], TypeOptions::Flag(true)));
        assert_eq!(config.events.len(), 4);
    }
}
