//! Event type definitions
//!
//! An `EventType` is a named audit-event definition: enabled flag, message
//! template and details schema. Types are immutable once built; entity-scoped
//! variants are derived with [`EventType::clone_with`], which merges overrides
//! onto the original construction options and re-runs the same defaulting
//! path as registration.

use crate::error::{AuditError, Result};
use crate::merge::{deep_merge, get_map_path, get_path, set_path};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Built-in lifecycle type: object created
pub const CREATE: &str = "create";
/// Built-in lifecycle type: object updated
pub const UPDATE: &str = "update";
/// Built-in lifecycle type: object removed
pub const REMOVE: &str = "remove";

/// Names of the built-in lifecycle types
pub const BUILTIN_TYPES: [&str; 3] = [CREATE, UPDATE, REMOVE];

/// Default options for a built-in type, or `None` for any other name
pub fn builtin_defaults(name: &str) -> Option<EventTypeOptions> {
    let verb = match name {
        CREATE => "created",
        UPDATE => "updated",
        REMOVE => "removed",
        _ => return None,
    };
    Some(EventTypeOptions::new().message(format!(
        "a %(objectType)s %(objectName)s was {}",
        verb
    )))
}

/// Closure computing a detail value from a subject snapshot
pub type ComputeFn = dyn Fn(&Value) -> Option<Value> + Send + Sync;

/// Where a detail value is read from on the subject
#[derive(Clone)]
pub enum MapFrom {
    /// Dot-separated path into the subject snapshot
    Path(String),

    /// Value computed from the whole subject snapshot
    Computed(Arc<ComputeFn>),
}

impl MapFrom {
    /// Create a computed mapping
    pub fn computed(f: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self::Computed(Arc::new(f))
    }

    /// Evaluate the mapping against a subject snapshot
    ///
    /// Returns `None` when the path is absent or the closure yields nothing.
    pub fn resolve(&self, snapshot: &Value) -> Option<Value> {
        match self {
            Self::Path(path) => get_path(snapshot, path).cloned(),
            Self::Computed(f) => f(snapshot),
        }
    }
}

impl fmt::Debug for MapFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for MapFrom {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

// Configuration files can only express paths.
impl<'de> Deserialize<'de> for MapFrom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(MapFrom::Path)
    }
}

/// Schema entry for one detail field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailField {
    /// Whether the field must be present for the record to validate
    #[serde(default)]
    pub required: Option<bool>,

    /// Value seeded into details when nothing else provides one
    #[serde(default)]
    pub default: Option<Value>,

    /// Subject mapping for this field
    #[serde(default)]
    pub map_from: Option<MapFrom>,
}

impl DetailField {
    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    /// Set the default value
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Map the field from a path on the subject
    pub fn map_from(mut self, path: impl Into<String>) -> Self {
        self.map_from = Some(MapFrom::Path(path.into()));
        self
    }

    /// Map the field from a closure over the subject snapshot
    pub fn computed(mut self, f: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static) -> Self {
        self.map_from = Some(MapFrom::computed(f));
        self
    }

    fn is_required(&self) -> bool {
        self.required == Some(true)
    }

    fn merge(&mut self, other: &DetailField) {
        if other.required.is_some() {
            self.required = other.required;
        }
        if let Some(incoming) = &other.default {
            match self.default.as_mut() {
                Some(current) => deep_merge(current, incoming),
                None => self.default = Some(incoming.clone()),
            }
        }
        if other.map_from.is_some() {
            self.map_from = other.map_from.clone();
        }
    }
}

/// Construction options for an event type
///
/// Every field is optional so that options can be layered: built-in
/// defaults, then registration options, then entity overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeOptions {
    /// Enabled flag; unset means enabled
    #[serde(default)]
    pub enabled: Option<bool>,

    /// printf-style message template
    #[serde(default)]
    pub message: Option<String>,

    /// Details schema keyed by field path
    #[serde(default)]
    pub details: BTreeMap<String, DetailField>,
}

impl EventTypeOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the enabled flag
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Set the message template
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    /// Add or replace a details schema field
    pub fn detail(mut self, path: impl Into<String>, field: DetailField) -> Self {
        self.details.insert(path.into(), field);
        self
    }

    /// Merge `other` onto these options; `other` wins where both are set
    pub fn merge(&mut self, other: &EventTypeOptions) {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.message.is_some() {
            self.message = other.message.clone();
        }
        for (path, field) in &other.details {
            self.details
                .entry(path.clone())
                .and_modify(|existing| existing.merge(field))
                .or_insert_with(|| field.clone());
        }
    }
}

/// Either an enable/disable flag or full options
///
/// Mirrors the configuration shape `name: true | false | { ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeOptions {
    /// Shorthand for `{ enabled: flag }`
    Flag(bool),
    /// Full options
    Options(EventTypeOptions),
}

impl TypeOptions {
    /// Expand into full options
    pub fn into_options(self) -> EventTypeOptions {
        match self {
            Self::Flag(enabled) => EventTypeOptions::new().enabled(enabled),
            Self::Options(options) => options,
        }
    }
}

impl From<bool> for TypeOptions {
    fn from(enabled: bool) -> Self {
        Self::Flag(enabled)
    }
}

impl From<EventTypeOptions> for TypeOptions {
    fn from(options: EventTypeOptions) -> Self {
        Self::Options(options)
    }
}

/// A named audit-event definition
#[derive(Debug, Clone)]
pub struct EventType {
    name: String,
    enabled: bool,
    options: EventTypeOptions,
}

impl EventType {
    /// Build a type from options, layered over the built-in defaults for `name`
    pub fn create(name: impl Into<String>, options: impl Into<TypeOptions>) -> Self {
        let name = name.into();
        let mut merged = builtin_defaults(&name).unwrap_or_default();
        merged.merge(&options.into().into_options());
        Self::from_options(name, merged)
    }

    /// A minimal type with only a name: enabled, no template, no schema
    pub fn bare(name: impl Into<String>) -> Self {
        Self::from_options(name.into(), EventTypeOptions::default())
    }

    fn from_options(name: String, options: EventTypeOptions) -> Self {
        Self {
            name,
            enabled: options.enabled != Some(false),
            options,
        }
    }

    /// Derive a new type with `overrides` merged onto this type's options
    ///
    /// The name never changes and `self` is left untouched.
    pub fn clone_with(&self, overrides: impl Into<TypeOptions>) -> Self {
        let mut options = self.options.clone();
        options.merge(&overrides.into().into_options());
        Self::create(self.name.clone(), options)
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether records of this type are registrable
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Message template, if one is configured
    pub fn message_template(&self) -> Option<&str> {
        self.options.message.as_deref()
    }

    /// Details schema keyed by field path
    pub fn details_schema(&self) -> &BTreeMap<String, DetailField> {
        &self.options.details
    }

    /// Options this type was constructed from
    pub fn options(&self) -> &EventTypeOptions {
        &self.options
    }

    /// Defaults of every schema field that declares one
    pub fn default_details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        for (path, field) in &self.options.details {
            if let Some(default) = &field.default {
                set_path(&mut details, path, default.clone());
            }
        }
        details
    }

    /// Values of every schema field mapped from the subject
    ///
    /// Fields whose mapping yields nothing are omitted.
    pub fn mapped_details(&self, snapshot: &Value) -> Map<String, Value> {
        let mut details = Map::new();
        for (path, field) in &self.options.details {
            if let Some(value) = field.map_from.as_ref().and_then(|m| m.resolve(snapshot)) {
                set_path(&mut details, path, value);
            }
        }
        details
    }

    /// Check that every required schema field is present in `details`
    ///
    /// Returns the first missing field as `AuditError::Validation`.
    pub fn validate(&self, details: &Map<String, Value>) -> Result<()> {
        let missing = self
            .options
            .details
            .iter()
            .find(|(path, field)| field.is_required() && get_map_path(details, path).is_none());

        match missing {
            Some((path, _)) => Err(AuditError::Validation {
                event_type: self.name.clone(),
                field: path.clone(),
            }),
            None => Ok(()),
        }
    }
}
