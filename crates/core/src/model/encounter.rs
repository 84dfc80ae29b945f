use super::{Location, Person};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A clinical contact during which observations are recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    pub uuid: String,
    pub encounter_type: String,
    pub encounter_datetime: DateTime<Utc>,
    pub patient: Option<Arc<Person>>,
    pub location: Option<Arc<Location>>,
    pub voided: bool,
}
