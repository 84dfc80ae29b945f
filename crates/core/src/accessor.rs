//! Property access: generic field tables, registered overrides and the resolver that picks
//! between them.
//!
//! Each resource builds a [`FieldTable`] describing plain structural access to its fields
//! and an [`Overrides`] set for the properties whose read or write behaviour differs from
//! the field itself. [`AccessorResolver`] consults the overrides first and falls back to
//! the field table. Both are built once when the registry is assembled and never mutated
//! afterwards.

use crate::context::RequestContext;
use crate::resource::Representable;
use crate::{ReprError, ReprResult};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Value produced by a property getter.
pub enum PropertyValue {
    /// No value; the property is omitted from the projection.
    Absent,
    /// Already-rendered JSON.
    Scalar(Value),
    /// A nested entity, rendered at the level the description declares.
    Entity(Arc<dyn Representable>),
    /// A collection of nested entities.
    Entities(Vec<Arc<dyn Representable>>),
}

impl PropertyValue {
    pub fn scalar(value: impl Into<Value>) -> Self {
        PropertyValue::Scalar(value.into())
    }

    /// `None` becomes [`PropertyValue::Absent`].
    pub fn optional<T: Into<Value>>(value: Option<T>) -> Self {
        match value {
            Some(v) => PropertyValue::Scalar(v.into()),
            None => PropertyValue::Absent,
        }
    }

    /// `None` becomes [`PropertyValue::Absent`].
    pub fn entity<T: Representable>(value: Option<&Arc<T>>) -> Self {
        match value {
            Some(e) => PropertyValue::Entity(Arc::clone(e) as Arc<dyn Representable>),
            None => PropertyValue::Absent,
        }
    }

    pub fn entities<T: Representable>(values: &[Arc<T>]) -> Self {
        PropertyValue::Entities(
            values
                .iter()
                .map(|e| Arc::clone(e) as Arc<dyn Representable>)
                .collect(),
        )
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PropertyValue::Absent)
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Absent => f.write_str("Absent"),
            PropertyValue::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            PropertyValue::Entity(e) => f
                .debug_tuple("Entity")
                .field(&format_args!("{}/{}", e.resource_name(), e.entity_uuid()))
                .finish(),
            PropertyValue::Entities(list) => f
                .debug_tuple("Entities")
                .field(&list.len())
                .finish(),
        }
    }
}

/// Reads one property from an entity.
pub type Getter<T> = fn(&T, &RequestContext<'_>) -> ReprResult<PropertyValue>;

/// Writes one property on an entity from a submitted JSON value.
pub type Setter<T> = fn(&mut T, Value, &RequestContext<'_>) -> ReprResult<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Get,
    Set,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Get => f.write_str("get"),
            Direction::Set => f.write_str("set"),
        }
    }
}

struct FieldAccess<T> {
    get: Option<Getter<T>>,
    set: Option<Setter<T>>,
}

/// Generic structural access to a resource's fields, keyed by property name.
pub struct FieldTable<T> {
    entries: HashMap<&'static str, FieldAccess<T>>,
}

impl<T> FieldTable<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn field(mut self, name: &'static str, get: Getter<T>, set: Setter<T>) -> Self {
        self.entries.insert(
            name,
            FieldAccess {
                get: Some(get),
                set: Some(set),
            },
        );
        self
    }

    pub fn read_only(mut self, name: &'static str, get: Getter<T>) -> Self {
        self.entries.insert(
            name,
            FieldAccess {
                get: Some(get),
                set: None,
            },
        );
        self
    }

    fn getter(&self, name: &str) -> Option<Getter<T>> {
        self.entries.get(name).and_then(|a| a.get)
    }

    fn setter(&self, name: &str) -> Option<Setter<T>> {
        self.entries.get(name).and_then(|a| a.set)
    }
}

impl<T> Default for FieldTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Functions that replace generic access for one property and direction.
pub struct Overrides<T> {
    getters: HashMap<&'static str, Getter<T>>,
    setters: HashMap<&'static str, Setter<T>>,
    duplicates: Vec<(&'static str, Direction)>,
}

impl<T> Overrides<T> {
    pub fn new() -> Self {
        Self {
            getters: HashMap::new(),
            setters: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    pub fn getter(mut self, name: &'static str, get: Getter<T>) -> Self {
        if self.getters.insert(name, get).is_some() {
            self.duplicates.push((name, Direction::Get));
        }
        self
    }

    pub fn setter(mut self, name: &'static str, set: Setter<T>) -> Self {
        if self.setters.insert(name, set).is_some() {
            self.duplicates.push((name, Direction::Set));
        }
        self
    }
}

impl<T> Default for Overrides<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves property names to accessors for one resource type.
///
/// Resolution order: an override for the exact (property, direction) pair, then the
/// generic field table. Neither yields [`ReprError::PropertyNotFound`].
pub struct AccessorResolver<T> {
    resource: &'static str,
    fields: FieldTable<T>,
    overrides: Overrides<T>,
}

impl<T> AccessorResolver<T> {
    /// Fails if the same (property, direction) was overridden twice.
    pub fn new(
        resource: &'static str,
        fields: FieldTable<T>,
        overrides: Overrides<T>,
    ) -> ReprResult<Self> {
        if let Some((property, direction)) = overrides.duplicates.first() {
            return Err(ReprError::DuplicateOverride {
                resource,
                property: (*property).to_string(),
                direction: *direction,
            });
        }
        Ok(Self {
            resource,
            fields,
            overrides,
        })
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn resolve_getter(&self, name: &str) -> ReprResult<Getter<T>> {
        self.overrides
            .getters
            .get(name)
            .copied()
            .or_else(|| self.fields.getter(name))
            .ok_or_else(|| self.not_found(name))
    }

    pub fn resolve_setter(&self, name: &str) -> ReprResult<Setter<T>> {
        self.overrides
            .setters
            .get(name)
            .copied()
            .or_else(|| self.fields.setter(name))
            .ok_or_else(|| self.not_found(name))
    }

    pub fn has_override(&self, name: &str, direction: Direction) -> bool {
        match direction {
            Direction::Get => self.overrides.getters.contains_key(name),
            Direction::Set => self.overrides.setters.contains_key(name),
        }
    }

    fn not_found(&self, name: &str) -> ReprError {
        ReprError::PropertyNotFound {
            resource: self.resource,
            property: name.to_string(),
        }
    }
}
