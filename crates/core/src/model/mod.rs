//! Domain model for observations and the entities they reference.
//!
//! The model is plain data. Entities reference each other through `Arc` so a nested
//! projection can hand out shared handles without copying; the parent of a grouped
//! observation is held by uuid and resolved through the observation service on demand.

mod audit;
mod concept;
mod encounter;
mod location;
mod obs;
mod order;
mod person;

pub use audit::AuditInfo;
pub use concept::{Concept, ConceptDatatype, ConceptName, ConceptNumeric};
pub use encounter::Encounter;
pub use location::Location;
pub use obs::{Obs, ObsValue};
pub use order::Order;
pub use person::{Person, PersonName};
