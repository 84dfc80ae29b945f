//! # Obsrest Core
//!
//! Representation engine for the observation REST resource.
//!
//! This crate turns domain entities into named representations and back:
//! - [`ResourceDescription`]: per-level ordered property lists
//! - [`AccessorResolver`]: generic field access with registered overrides
//! - [`project`]: recursive projection with cycle and depth guards
//! - [`pipeline`]: create/update/void/purge/search through the service delegates
//! - [`PagedResult`]: paging of search results
//!
//! **No API concerns**: HTTP routing, request parsing and storage belong in `api-rest` and
//! `obsrest-store`. Storage and lookups are reached only through the traits in
//! [`services`].

pub mod accessor;
pub mod config;
pub mod constants;
pub mod context;
pub mod conversion;
pub mod description;
mod error;
pub mod model;
pub mod paging;
pub mod pipeline;
pub mod projector;
pub mod representation;
pub mod resource;
pub mod resources;
pub mod services;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use accessor::{AccessorResolver, Direction, FieldTable, Overrides, PropertyValue};
pub use config::CoreConfig;
pub use context::RequestContext;
pub use description::{LinkDescriptor, LinkTarget, PropertyDescriptor, ResourceDescription};
pub use error::{ReprError, ReprResult};
pub use paging::{PagedResult, PagingContext};
pub use pipeline::DataResource;
pub use projector::{project, project_all, SimpleObject};
pub use representation::Representation;
pub use resource::{RegistryBuilder, Representable, Resource, ResourceRegistry};
pub use resources::{default_registry, obs_by_encounter, obs_by_patient};
pub use services::{ObsService, ReferenceResolver, ServiceError, ServiceResult, Services};
