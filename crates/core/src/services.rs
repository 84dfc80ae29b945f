//! Contracts for the external domain services the engine delegates to.
//!
//! Storage, vocabulary and patient/encounter lookups live outside this crate. The engine
//! only needs the narrow surface below; failures are passed through unchanged as
//! [`ServiceError`] and never retried here.

use crate::model::{Concept, Encounter, Location, Obs, Order, Person};
use obsrest_types::NonEmptyText;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The service refused the entity (missing mandatory data and similar).
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Persistence delegate for observations.
pub trait ObsService: Send + Sync {
    fn get_obs_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Obs>>;

    /// Persists `obs` and returns the durable copy that should be rendered back.
    fn save_obs(&self, obs: Obs, reason: &str) -> ServiceResult<Obs>;

    fn void_obs(&self, obs: &Obs, reason: &NonEmptyText) -> ServiceResult<Obs>;

    fn purge_obs(&self, obs: &Obs) -> ServiceResult<()>;

    /// Free-text search. Ranking and filtering are entirely the service's concern.
    fn get_observations(&self, query: &str) -> ServiceResult<Vec<Obs>>;

    fn get_observations_by_person(&self, person: &Person) -> ServiceResult<Vec<Obs>>;

    fn get_observations_by_encounter(&self, encounter: &Encounter) -> ServiceResult<Vec<Obs>>;
}

/// Resolves foreign identifiers to referenced entities. Absence is reported as `Ok(None)`;
/// the caller decides whether it is fatal.
pub trait ReferenceResolver: Send + Sync {
    fn concept_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Concept>>>;
    fn person_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Person>>>;
    fn encounter_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Encounter>>>;
    fn location_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Location>>>;
    fn order_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Order>>>;

    /// A person that is also registered as a patient.
    fn patient_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Person>>> {
        Ok(self.person_by_uuid(uuid)?.filter(|p| p.is_patient))
    }
}

/// The delegates handed to every request.
#[derive(Clone)]
pub struct Services {
    pub obs: Arc<dyn ObsService>,
    pub references: Arc<dyn ReferenceResolver>,
}

impl Services {
    pub fn new(obs: Arc<dyn ObsService>, references: Arc<dyn ReferenceResolver>) -> Self {
        Self { obs, references }
    }
}
