//! Per-entity-kind event type overrides
//!
//! Each entity kind that declares event configuration gets its own pool
//! shadowing the global registry. Only names explicitly overridden are
//! stored; everything else falls through to the registry at resolution.

use crate::error::{AuditError, Result};
use crate::event_type::{EventType, TypeOptions};
use crate::registry::EventTypeRegistry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Override pool for one entity kind
pub struct EntityEventOverrides {
    kind: String,

    /// name → overriding type (a disabled type counts as present-but-off)
    types: RwLock<HashMap<String, Arc<EventType>>>,

    /// Subject field holding the display name
    display_property: RwLock<Option<String>>,
}

impl EntityEventOverrides {
    /// Create an empty pool for `kind`
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            types: RwLock::new(HashMap::new()),
            display_property: RwLock::new(None),
        }
    }

    /// Entity kind this pool belongs to
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Override `name` for this entity kind
    ///
    /// A globally registered type is cloned with `options` merged on top
    /// (a flag only toggles `enabled`). An unknown name becomes a brand-new
    /// type local to this pool.
    pub fn override_type(
        &self,
        registry: &EventTypeRegistry,
        name: &str,
        options: impl Into<TypeOptions>,
    ) -> Result<Arc<EventType>> {
        if name.is_empty() {
            return Err(AuditError::Config(format!(
                "Event type name cannot be empty (entity '{}')",
                self.kind
            )));
        }

        let event_type = match registry.get(name)? {
            Some(global) => global.clone_with(options),
            None => EventType::create(name, options),
        };
        let event_type = Arc::new(event_type);

        let mut types = self.types.write().map_err(|e| {
            AuditError::Config(format!("Override pool lock poisoned: {}", e))
        })?;
        types.insert(name.to_string(), Arc::clone(&event_type));

        tracing::debug!(
            entity = %self.kind,
            event_type = %name,
            enabled = event_type.is_enabled(),
            "Entity event type overridden"
        );
        Ok(event_type)
    }

    /// Local override for `name`, if any
    pub fn get(&self, name: &str) -> Result<Option<Arc<EventType>>> {
        let types = self.types.read().map_err(|e| {
            AuditError::Config(format!("Override pool lock poisoned: {}", e))
        })?;
        Ok(types.get(name).cloned())
    }

    /// Local override, else the registered global type, else `None`
    pub fn lookup(&self, registry: &EventTypeRegistry, name: &str) -> Result<Option<Arc<EventType>>> {
        match self.get(name)? {
            Some(local) => Ok(Some(local)),
            None => registry.get(name),
        }
    }

    /// Local override, else the registered global type, else a bare type
    pub fn resolve(&self, registry: &EventTypeRegistry, name: &str) -> Result<Arc<EventType>> {
        match self.get(name)? {
            Some(local) => Ok(local),
            None => registry.get_or_default(name),
        }
    }

    /// Overridden names, sorted
    pub fn names(&self) -> Result<Vec<String>> {
        let types = self.types.read().map_err(|e| {
            AuditError::Config(format!("Override pool lock poisoned: {}", e))
        })?;
        let mut names: Vec<String> = types.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Set the subject field used as display name
    pub fn set_display_property(&self, property: impl Into<String>) -> Result<()> {
        let mut slot = self.display_property.write().map_err(|e| {
            AuditError::Config(format!("Override pool lock poisoned: {}", e))
        })?;
        *slot = Some(property.into());
        Ok(())
    }

    /// Subject field used as display name, if configured for this kind
    pub fn display_property(&self) -> Result<Option<String>> {
        let slot = self.display_property.read().map_err(|e| {
            AuditError::Config(format!("Override pool lock poisoned: {}", e))
        })?;
        Ok(slot.clone())
    }
}

/// Lazily created override pools, one per entity kind
#[derive(Default)]
pub struct OverrideCatalog {
    pools: RwLock<HashMap<String, Arc<EntityEventOverrides>>>,
}

impl OverrideCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool for `kind`, if the kind ever declared configuration
    pub fn pool(&self, kind: &str) -> Result<Option<Arc<EntityEventOverrides>>> {
        let pools = self.pools.read().map_err(|e| {
            AuditError::Config(format!("Override catalog lock poisoned: {}", e))
        })?;
        Ok(pools.get(kind).cloned())
    }

    /// Pool for `kind`, created on first use
    pub fn get_or_create(&self, kind: &str) -> Result<Arc<EntityEventOverrides>> {
        if let Some(pool) = self.pool(kind)? {
            return Ok(pool);
        }

        let mut pools = self.pools.write().map_err(|e| {
            AuditError::Config(format!("Override catalog lock poisoned: {}", e))
        })?;
        let pool = pools
            .entry(kind.to_string())
            .or_insert_with(|| Arc::new(EntityEventOverrides::new(kind)));
        Ok(Arc::clone(pool))
    }

    /// Resolve `name` for `kind`: entity pool, then registry, then bare type
    pub fn resolve(
        &self,
        registry: &EventTypeRegistry,
        kind: &str,
        name: &str,
    ) -> Result<Arc<EventType>> {
        match self.pool(kind)? {
            Some(pool) => pool.resolve(registry, name),
            None => registry.get_or_default(name),
        }
    }

    /// Kinds with a pool, sorted
    pub fn kinds(&self) -> Result<Vec<String>> {
        let pools = self.pools.read().map_err(|e| {
            AuditError::Config(format!("Override catalog lock poisoned: {}", e))
        })?;
        let mut kinds: Vec<String> = pools.keys().cloned().collect();
        kinds.sort();
        Ok(kinds)
    }
}
