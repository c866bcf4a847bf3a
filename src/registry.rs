//! Global event type registry
//!
//! Holds the process-wide pool of named event types. Registration is
//! expected during startup; afterwards the registry is read-mostly.
//! Types are stored behind `Arc`, so a reader either sees the previous
//! definition or the fully built replacement, never a partial merge.

use crate::error::{AuditError, Result};
use crate::event_type::{EventType, TypeOptions};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Pool of globally known event types
pub struct EventTypeRegistry {
    /// name → type
    types: RwLock<HashMap<String, Arc<EventType>>>,
}

impl EventTypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
        }
    }

    /// Register a type, replacing any previous registration under `name`
    ///
    /// Options are layered over the built-in defaults for `name`, if any.
    pub fn register(&self, name: &str, options: impl Into<TypeOptions>) -> Result<Arc<EventType>> {
        if name.is_empty() {
            return Err(AuditError::Config(
                "Event type name cannot be empty".to_string(),
            ));
        }

        let event_type = Arc::new(EventType::create(name, options));
        let mut types = self.types.write().map_err(|e| {
            AuditError::Config(format!("Event type registry lock poisoned: {}", e))
        })?;
        types.insert(name.to_string(), Arc::clone(&event_type));

        tracing::debug!(
            event_type = %name,
            enabled = event_type.is_enabled(),
            "Event type registered"
        );
        Ok(event_type)
    }

    /// Get a registered type
    ///
    /// `None` means "never registered", which is distinct from a
    /// registered-but-disabled type.
    pub fn get(&self, name: &str) -> Result<Option<Arc<EventType>>> {
        let types = self.types.read().map_err(|e| {
            AuditError::Config(format!("Event type registry lock poisoned: {}", e))
        })?;
        Ok(types.get(name).cloned())
    }

    /// Get a registered type, or a bare enabled type with only `name` set
    pub fn get_or_default(&self, name: &str) -> Result<Arc<EventType>> {
        Ok(self
            .get(name)?
            .unwrap_or_else(|| Arc::new(EventType::bare(name))))
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// All registered names, sorted
    pub fn names(&self) -> Result<Vec<String>> {
        let types = self.types.read().map_err(|e| {
            AuditError::Config(format!("Event type registry lock poisoned: {}", e))
        })?;
        let mut names: Vec<String> = types.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Number of registered types
    pub fn len(&self) -> Result<usize> {
        let types = self.types.read().map_err(|e| {
            AuditError::Config(format!("Event type registry lock poisoned: {}", e))
        })?;
        Ok(types.len())
    }

    /// Whether no type is registered
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for EventTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_type::{EventTypeOptions, CREATE};

    #[test]
    fn test_register_builtin_uses_default_template() {
        let reg = EventTypeRegistry::new();
        let create = reg.register(CREATE, true).unwrap();
        assert!(create.is_enabled());
        assert_eq!(
            create.message_template(),
            Some("a %(objectType)s %(objectName)s was created")
        );
    }

    #[test]
    fn test_register_replaces_previous() {
        let reg = EventTypeRegistry::new();
        reg.register("hired", EventTypeOptions::new().message("first"))
            .unwrap();
        reg.register("hired", EventTypeOptions::new().message("second"))
            .unwrap();

        let hired = reg.get("hired").unwrap().unwrap();
        assert_eq!(hired.message_template(), Some("second"));
        assert_eq!(reg.len().unwrap(), 1);
    }

    #[test]
    fn test_poisoned_lock_is_config_error() {
        let reg = Arc::new(EventTypeRegistry::new());
        let writer = Arc::clone(&reg);
        let _ = std::thread::spawn(move || {
            let _guard = writer.types.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(reg.len(), Err(AuditError::Config(_))));
        assert!(matches!(reg.is_empty(), Err(AuditError::Config(_))));
    }

    #[test]
    fn test_register_empty_name_fails() {
        let reg = EventTypeRegistry::new();
        assert!(reg.register("", true).is_err());
        assert!(reg.is_empty().unwrap());
    }

    #[test]
    fn test_absent_is_distinct_from_disabled() {
        let reg = EventTypeRegistry::new();
        reg.register("update", false).unwrap();

        let update = reg.get("update").unwrap();
        assert!(update.is_some());
        assert!(!update.unwrap().is_enabled());
        assert!(reg.get("remove").unwrap().is_none());
    }

    #[test]
    fn test_get_or_default() {
        let reg = EventTypeRegistry::new();
        let t = reg.get_or_default("employee-of-the-month").unwrap();
        assert_eq!(t.name(), "employee-of-the-month");
        assert!(t.is_enabled());
        assert!(t.message_template().is_none());
        assert!(!reg.contains("employee-of-the-month").unwrap());
    }

    #[test]
    fn test_names_sorted() {
        let reg = EventTypeRegistry::new();
        reg.register("update", true).unwrap();
        reg.register("create", true).unwrap();
        reg.register("hired", true).unwrap();
        assert_eq!(reg.names().unwrap(), vec!["create", "hired", "update"]);
    }
}
