//! Resource declarations for observations and the entities they reference.
//!
//! Each module implements [`Resource`](crate::resource::Resource) for one model type.
//! Only observations are writable; the others are exposed read-only as nested
//! projections.

mod concept;
mod encounter;
mod location;
mod obs;
mod order;
mod person;

pub use obs::{obs_by_encounter, obs_by_patient};

use crate::model::{Concept, Encounter, Location, Obs, Order, Person};
use crate::resource::ResourceRegistry;
use crate::ReprResult;

/// Registry with every resource in this crate registered.
pub fn default_registry() -> ReprResult<ResourceRegistry> {
    Ok(ResourceRegistry::builder()
        .register::<Obs>()?
        .register::<Concept>()?
        .register::<Person>()?
        .register::<Encounter>()?
        .register::<Location>()?
        .register::<Order>()?
        .build())
}
