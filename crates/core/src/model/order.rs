use super::{Concept, Person};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A clinical order an observation may be a result of.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Order {
    pub uuid: String,
    pub concept: Option<Arc<Concept>>,
    pub instructions: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub patient: Option<Arc<Person>>,
    pub voided: bool,
}
