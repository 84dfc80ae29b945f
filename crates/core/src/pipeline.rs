//! Delegating update pipeline.
//!
//! The inverse of the projector: a submitted property map is applied to a new or fetched
//! entity through the resolved setters, and the result is handed to the persistence
//! delegate. What comes back from the delegate is the durable entity and is what callers
//! should project.

use crate::context::RequestContext;
use crate::paging::PagedResult;
use crate::resource::Resource;
use crate::{ReprError, ReprResult};
use obsrest_types::NonEmptyText;
use serde_json::{Map, Value};

/// A resource that can be created, updated, voided and searched through its delegate.
pub trait DataResource: Resource {
    /// Properties applied before any other submitted key, in this order.
    fn setter_order() -> &'static [&'static str] {
        &[]
    }

    fn new_delegate() -> Self;

    fn is_voided(&self) -> bool;

    fn get_by_uuid(uuid: &str, ctx: &RequestContext<'_>) -> ReprResult<Option<Self>>;

    fn save(self, ctx: &RequestContext<'_>) -> ReprResult<Self>;

    fn void(&self, reason: &NonEmptyText, ctx: &RequestContext<'_>) -> ReprResult<Self>;

    fn purge(&self, ctx: &RequestContext<'_>) -> ReprResult<()>;

    fn search(query: &str, ctx: &RequestContext<'_>) -> ReprResult<Vec<Self>>;
}

/// Fetches `uuid` or fails with [`ReprError::NotFound`].
pub fn retrieve<T: DataResource>(uuid: &str, ctx: &RequestContext<'_>) -> ReprResult<T> {
    T::get_by_uuid(uuid, ctx)?.ok_or_else(|| ReprError::NotFound {
        resource: T::NAME,
        id: uuid.to_string(),
    })
}

/// Builds a new entity from `input` and saves it.
pub fn create<T: DataResource>(
    input: &Map<String, Value>,
    ctx: &RequestContext<'_>,
) -> ReprResult<T> {
    let mut entity = T::new_delegate();
    apply_properties(&mut entity, input, ctx)?;
    tracing::debug!(resource = T::NAME, uuid = entity.uuid(), "creating");
    entity.save(ctx)
}

/// Applies `input` to the stored entity `uuid` and saves it.
pub fn update<T: DataResource>(
    uuid: &str,
    input: &Map<String, Value>,
    ctx: &RequestContext<'_>,
) -> ReprResult<T> {
    let mut entity = retrieve::<T>(uuid, ctx)?;
    apply_properties(&mut entity, input, ctx)?;
    tracing::debug!(resource = T::NAME, uuid, "updating");
    entity.save(ctx)
}

/// Applies every key of `input` through its setter.
///
/// All setters are resolved before any is invoked, so an unknown key leaves the entity
/// untouched. Keys named by [`DataResource::setter_order`] run first in that order, the
/// rest in input order. The first setter failure aborts the whole operation.
pub fn apply_properties<T: DataResource>(
    entity: &mut T,
    input: &Map<String, Value>,
    ctx: &RequestContext<'_>,
) -> ReprResult<()> {
    let resolver = ctx.registry().resolver::<T>()?;

    let order: &[&str] = T::setter_order();
    let ordered = order
        .iter()
        .copied()
        .filter(|name| input.contains_key(*name));
    let rest = input
        .keys()
        .map(String::as_str)
        .filter(|name| !order.contains(name));

    let mut plan = Vec::with_capacity(input.len());
    for name in ordered.chain(rest) {
        let setter = resolver.resolve_setter(name)?;
        let value = input.get(name).cloned().unwrap_or(Value::Null);
        plan.push((name, setter, value));
    }

    for (name, setter, value) in plan {
        tracing::trace!(resource = T::NAME, property = name, "set");
        setter(entity, value, ctx)?;
    }
    Ok(())
}

/// Voids `entity`. Voiding an already voided entity succeeds without calling the
/// delegate.
pub fn delete<T: DataResource>(
    entity: &T,
    reason: &NonEmptyText,
    ctx: &RequestContext<'_>,
) -> ReprResult<()> {
    if entity.is_voided() {
        tracing::debug!(resource = T::NAME, uuid = entity.uuid(), "already voided");
        return Ok(());
    }
    entity.void(reason, ctx)?;
    tracing::debug!(resource = T::NAME, uuid = entity.uuid(), %reason, "voided");
    Ok(())
}

/// Removes `entity` permanently.
pub fn purge<T: DataResource>(entity: &T, ctx: &RequestContext<'_>) -> ReprResult<()> {
    entity.purge(ctx)?;
    tracing::debug!(resource = T::NAME, uuid = entity.uuid(), "purged");
    Ok(())
}

/// Runs the delegate's search and pages the result with the context's window.
pub fn search<T: DataResource>(
    query: &str,
    ctx: &RequestContext<'_>,
) -> ReprResult<PagedResult<T>> {
    let all = T::search(query, ctx)?;
    Ok(PagedResult::paginate(all, ctx.paging()))
}
