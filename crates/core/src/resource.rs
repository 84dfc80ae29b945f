//! Resource declarations and the process-wide registry.
//!
//! A [`Resource`] ties an entity type to its descriptions, its generic field table and its
//! overrides. [`ResourceRegistry`] holds one type-erased handler per resource so the
//! projector can walk a graph of mixed entity types by name. The registry is assembled
//! once at startup through [`RegistryBuilder`] and is immutable afterwards, so it can be
//! shared across request threads behind an `Arc` without locking.

use crate::accessor::{AccessorResolver, FieldTable, Overrides, PropertyValue};
use crate::context::RequestContext;
use crate::description::ResourceDescription;
use crate::representation::Representation;
use crate::{ReprError, ReprResult};
use std::any::Any;
use std::collections::HashMap;

/// Object-safe view of any entity the projector can render.
pub trait Representable: Any + Send + Sync {
    fn resource_name(&self) -> &'static str;
    fn entity_uuid(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

/// Declaration of an exposed entity type.
pub trait Resource: Any + Send + Sync + Sized {
    /// Registry key and URL segment.
    const NAME: &'static str;

    fn uuid(&self) -> &str;

    /// Human-readable label used by reference stubs.
    fn display(&self, ctx: &RequestContext<'_>) -> String;

    /// `None` means the level is not supported by this resource. A missing `Ref`
    /// description falls back to a reference stub.
    fn description(representation: Representation) -> Option<ResourceDescription>;

    fn fields() -> FieldTable<Self>;

    fn overrides() -> Overrides<Self> {
        Overrides::new()
    }
}

impl<T: Resource> Representable for T {
    fn resource_name(&self) -> &'static str {
        T::NAME
    }

    fn entity_uuid(&self) -> &str {
        Resource::uuid(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) trait ResourceHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self, representation: Representation) -> Option<&ResourceDescription>;
    fn display(&self, entity: &dyn Representable, ctx: &RequestContext<'_>) -> ReprResult<String>;
    fn get(
        &self,
        entity: &dyn Representable,
        property: &str,
        ctx: &RequestContext<'_>,
    ) -> ReprResult<PropertyValue>;
    fn as_any(&self) -> &dyn Any;
}

struct TypedHandler<T: Resource> {
    descriptions: HashMap<Representation, ResourceDescription>,
    resolver: AccessorResolver<T>,
}

impl<T: Resource> TypedHandler<T> {
    fn build() -> ReprResult<Self> {
        let mut descriptions = HashMap::new();
        for representation in Representation::ALL {
            if let Some(description) = T::description(representation) {
                description.validate(T::NAME)?;
                descriptions.insert(representation, description);
            }
        }

        Ok(Self {
            descriptions,
            resolver: AccessorResolver::new(T::NAME, T::fields(), T::overrides())?,
        })
    }

    fn downcast<'e>(&self, entity: &'e dyn Representable) -> ReprResult<&'e T> {
        entity
            .as_any()
            .downcast_ref::<T>()
            .ok_or(ReprError::TypeMismatch {
                expected: T::NAME,
                found: entity.resource_name(),
            })
    }
}

impl<T: Resource> ResourceHandler for TypedHandler<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn description(&self, representation: Representation) -> Option<&ResourceDescription> {
        self.descriptions.get(&representation)
    }

    fn display(&self, entity: &dyn Representable, ctx: &RequestContext<'_>) -> ReprResult<String> {
        Ok(self.downcast(entity)?.display(ctx))
    }

    fn get(
        &self,
        entity: &dyn Representable,
        property: &str,
        ctx: &RequestContext<'_>,
    ) -> ReprResult<PropertyValue> {
        let entity = self.downcast(entity)?;
        let getter = self.resolver.resolve_getter(property)?;
        getter(entity, ctx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Immutable table of registered resources.
pub struct ResourceRegistry {
    handlers: HashMap<&'static str, Box<dyn ResourceHandler>>,
}

impl ResourceRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Ordered property list for `resource` at `representation`, or `None` when the level
    /// (or the resource) is not supported.
    pub fn describe(
        &self,
        resource: &str,
        representation: Representation,
    ) -> Option<&ResourceDescription> {
        self.handlers
            .get(resource)
            .and_then(|h| h.description(representation))
    }

    /// Typed accessor resolver for `T`, used by the update pipeline.
    pub fn resolver<T: Resource>(&self) -> ReprResult<&AccessorResolver<T>> {
        let handler = self.handler(T::NAME)?;
        handler
            .as_any()
            .downcast_ref::<TypedHandler<T>>()
            .map(|h| &h.resolver)
            .ok_or(ReprError::TypeMismatch {
                expected: T::NAME,
                found: handler.name(),
            })
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.handlers.contains_key(resource)
    }

    pub fn resource_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn handler(&self, resource: &str) -> ReprResult<&dyn ResourceHandler> {
        self.handlers
            .get(resource)
            .map(|h| h.as_ref())
            .ok_or_else(|| ReprError::UnknownResource(resource.to_string()))
    }
}

/// Startup-time builder for [`ResourceRegistry`].
pub struct RegistryBuilder {
    handlers: HashMap<&'static str, Box<dyn ResourceHandler>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `T`, validating its descriptions and overrides.
    pub fn register<T: Resource>(mut self) -> ReprResult<Self> {
        if self.handlers.contains_key(T::NAME) {
            return Err(ReprError::DuplicateResource(T::NAME));
        }
        let handler = TypedHandler::<T>::build()?;
        tracing::debug!(resource = T::NAME, "registered resource");
        self.handlers.insert(T::NAME, Box::new(handler));
        Ok(self)
    }

    pub fn build(self) -> ResourceRegistry {
        ResourceRegistry {
            handlers: self.handlers,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
