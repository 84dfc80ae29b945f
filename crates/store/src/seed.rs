//! YAML seed files.
//!
//! A seed lists the vocabulary, people, encounters, orders and observations a store starts
//! with. Sections are loaded in dependency order (locations, concepts, persons,
//! encounters, orders, observations) and every cross reference must point at an entry
//! that is already loaded. Grouping observations name their members by uuid, so members
//! must appear earlier in the `observations` list.
//!
//! ```yaml
//! concepts:
//!   - uuid: 5089aaaa-0000-4000-8000-000000000001
//!     name: Weight
//!     datatype: Numeric
//!     class: Finding
//!     units: kg
//! persons:
//!   - uuid: a0000000-0000-4000-8000-000000000001
//!     given_name: Jane
//!     family_name: Doe
//!     patient: true
//! observations:
//!   - uuid: 0b000000-0000-4000-8000-000000000001
//!     person: a0000000-0000-4000-8000-000000000001
//!     concept: 5089aaaa-0000-4000-8000-000000000001
//!     datetime: 2024-03-01T09:30:00Z
//!     value: "71.5"
//! ```

use crate::{MemoryStore, StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use obsrest_core::conversion::parse_datetime;
use obsrest_core::model::{
    AuditInfo, Concept, ConceptDatatype, ConceptName, ConceptNumeric, Encounter, Location, Obs,
    Order, Person, PersonName,
};
use obsrest_core::{ObsService, ReferenceResolver, ServiceError};
use obsrest_types::{Locale, NonEmptyText};
use obsrest_uuid::EntityUuid;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// User recorded as creator of seeded entities.
const SEED_USER: &str = "seed";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedWire {
    #[serde(default)]
    locations: Vec<LocationWire>,
    #[serde(default)]
    concepts: Vec<ConceptWire>,
    #[serde(default)]
    persons: Vec<PersonWire>,
    #[serde(default)]
    encounters: Vec<EncounterWire>,
    #[serde(default)]
    orders: Vec<OrderWire>,
    #[serde(default)]
    observations: Vec<ObsWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LocationWire {
    uuid: EntityUuid,
    name: NonEmptyText,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    retired: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConceptWire {
    uuid: EntityUuid,
    name: NonEmptyText,
    #[serde(default)]
    locale: Option<Locale>,
    /// Further names, e.g. translations.
    #[serde(default)]
    names: Vec<ConceptNameWire>,
    datatype: ConceptDatatype,
    #[serde(default = "default_concept_class")]
    class: String,
    #[serde(default)]
    units: Option<String>,
    #[serde(default)]
    precise: Option<bool>,
    #[serde(default)]
    hi_normal: Option<f64>,
    #[serde(default)]
    low_normal: Option<f64>,
    #[serde(default)]
    answers: Vec<EntityUuid>,
    #[serde(default)]
    retired: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConceptNameWire {
    name: NonEmptyText,
    locale: Locale,
    #[serde(default)]
    preferred: bool,
}

fn default_concept_class() -> String {
    "Misc".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PersonWire {
    uuid: EntityUuid,
    given_name: NonEmptyText,
    #[serde(default)]
    middle_name: Option<String>,
    family_name: NonEmptyText,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    birthdate: Option<NaiveDate>,
    #[serde(default)]
    patient: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EncounterWire {
    uuid: EntityUuid,
    #[serde(rename = "type")]
    encounter_type: NonEmptyText,
    datetime: String,
    patient: EntityUuid,
    #[serde(default)]
    location: Option<EntityUuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OrderWire {
    uuid: EntityUuid,
    concept: EntityUuid,
    patient: EntityUuid,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ObsWire {
    uuid: EntityUuid,
    person: EntityUuid,
    concept: EntityUuid,
    datetime: String,
    /// Rendered value; the answer concept's uuid for coded concepts.
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    members: Vec<EntityUuid>,
    #[serde(default)]
    encounter: Option<EntityUuid>,
    #[serde(default)]
    location: Option<EntityUuid>,
    #[serde(default)]
    order: Option<EntityUuid>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    accession_number: Option<String>,
}

/// A parsed seed file, ready to be loaded into a [`MemoryStore`].
#[derive(Debug)]
pub struct Seed {
    wire: SeedWire,
}

impl Seed {
    /// Parses seed YAML.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Translation`] naming the failing path (for example
    /// `observations[2].concept`) when the YAML does not match the seed schema, including
    /// unknown keys and malformed uuids.
    pub fn parse(yaml_text: &str) -> StoreResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, SeedWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(StoreError::Translation(format!(
                    "Seed schema mismatch at {path}: {source}"
                )));
            }
        };

        Ok(Self { wire })
    }

    pub fn observation_count(&self) -> usize {
        self.wire.observations.len()
    }

    /// Loads every section into `store`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownReference`] when an entry references something not
    /// loaded before it, and [`StoreError::InvalidInput`] when a value cannot be converted
    /// for its concept's datatype.
    pub fn load_into(&self, store: &MemoryStore) -> StoreResult<()> {
        let now = Utc::now();

        for wire in &self.wire.locations {
            store
                .add_location(Location {
                    uuid: wire.uuid.to_string(),
                    name: wire.name.to_string(),
                    description: wire.description.clone(),
                    retired: wire.retired,
                })?;
        }

        for wire in &self.wire.concepts {
            store.add_concept(concept_from_wire(wire))?;
        }
        for wire in &self.wire.concepts {
            for answer in &wire.answers {
                if store.concept_by_uuid(&answer.to_string())?.is_none() {
                    return Err(unknown("concept", answer));
                }
            }
        }

        for wire in &self.wire.persons {
            store
                .add_person(Person {
                    uuid: wire.uuid.to_string(),
                    names: vec![PersonName {
                        given_name: wire.given_name.to_string(),
                        middle_name: wire.middle_name.clone(),
                        family_name: wire.family_name.to_string(),
                        preferred: true,
                    }],
                    gender: wire.gender.clone(),
                    birthdate: wire.birthdate,
                    is_patient: wire.patient,
                    voided: false,
                    audit: AuditInfo::created(SEED_USER, now),
                })?;
        }

        for wire in &self.wire.encounters {
            let patient = required(
                store.patient_by_uuid(&wire.patient.to_string()),
                "patient",
                &wire.patient,
            )?;
            let location = optional(
                wire.location.as_ref(),
                |uuid| store.location_by_uuid(uuid),
                "location",
            )?;
            store
                .add_encounter(Encounter {
                    uuid: wire.uuid.to_string(),
                    encounter_type: wire.encounter_type.to_string(),
                    encounter_datetime: datetime(&wire.datetime)?,
                    patient: Some(patient),
                    location,
                    voided: false,
                })?;
        }

        for wire in &self.wire.orders {
            let concept = required(
                store.concept_by_uuid(&wire.concept.to_string()),
                "concept",
                &wire.concept,
            )?;
            let patient = required(
                store.patient_by_uuid(&wire.patient.to_string()),
                "patient",
                &wire.patient,
            )?;
            let start_date = wire.start_date.as_deref().map(datetime).transpose()?;
            store
                .add_order(Order {
                    uuid: wire.uuid.to_string(),
                    concept: Some(concept),
                    instructions: wire.instructions.clone(),
                    start_date,
                    patient: Some(patient),
                    voided: false,
                })?;
        }

        for wire in &self.wire.observations {
            store.insert_obs(obs_from_wire(wire, store, now)?)?;
        }

        tracing::info!(
            concepts = self.wire.concepts.len(),
            persons = self.wire.persons.len(),
            observations = self.wire.observations.len(),
            "seed loaded"
        );
        Ok(())
    }
}

fn obs_from_wire(wire: &ObsWire, store: &MemoryStore, now: DateTime<Utc>) -> StoreResult<Obs> {
    let person = required(
        store.person_by_uuid(&wire.person.to_string()),
        "person",
        &wire.person,
    )?;
    if !person.is_patient {
        tracing::warn!(
            obs = %wire.uuid,
            person = %wire.person,
            "observation recorded for a non-patient"
        );
    }
    let concept = required(
        store.concept_by_uuid(&wire.concept.to_string()),
        "concept",
        &wire.concept,
    )?;
    if concept.retired {
        tracing::warn!(
            obs = %wire.uuid,
            concept = %wire.concept,
            "observation uses a retired concept"
        );
    }

    let mut obs = Obs {
        uuid: wire.uuid.to_string(),
        person: Some(person),
        concept: Some(concept.clone()),
        obs_datetime: Some(datetime(&wire.datetime)?),
        accession_number: wire.accession_number.clone(),
        comment: wire.comment.clone(),
        encounter: optional(
            wire.encounter.as_ref(),
            |uuid| store.encounter_by_uuid(uuid),
            "encounter",
        )?,
        location: optional(
            wire.location.as_ref(),
            |uuid| store.location_by_uuid(uuid),
            "location",
        )?,
        order: optional(wire.order.as_ref(), |uuid| store.order_by_uuid(uuid), "order")?,
        audit: AuditInfo::created(SEED_USER, now),
        ..Default::default()
    };

    for member in &wire.members {
        let stored = store
            .get_obs_by_uuid(&member.to_string())?
            .ok_or_else(|| unknown("obs", member))?;
        obs.group_members.push(Arc::new(stored));
    }

    match wire.value.as_deref() {
        None if obs.is_obs_grouping() => {}
        None => {
            tracing::warn!(obs = %wire.uuid, "observation seeded without a value");
        }
        Some(raw) if concept.datatype.is_coded() => {
            let answer_uuid = EntityUuid::parse(raw.trim()).map_err(|e| {
                StoreError::InvalidUuid(format!("observation {}: {e}", wire.uuid))
            })?;
            let answer = required(
                store.concept_by_uuid(&answer_uuid.to_string()),
                "concept",
                &answer_uuid,
            )?;
            if !concept.answers.contains(&answer.uuid) {
                tracing::warn!(
                    obs = %wire.uuid,
                    answer = %answer.uuid,
                    "coded value is not a listed answer of its concept"
                );
            }
            obs.set_value_coded(answer);
        }
        Some(raw) => obs.set_value_as_string(raw).map_err(|e| {
            StoreError::InvalidInput(format!("observation {}: {e}", wire.uuid))
        })?,
    }

    Ok(obs)
}

/// Reads and parses the seed at `path`, then loads it into a new store.
pub fn load_seed_file(path: &Path) -> StoreResult<MemoryStore> {
    let text = std::fs::read_to_string(path)?;
    let seed = Seed::parse(&text)?;
    let store = MemoryStore::new();
    seed.load_into(&store)?;
    tracing::debug!(path = %path.display(), "seed file read");
    Ok(store)
}

fn concept_from_wire(wire: &ConceptWire) -> Concept {
    let mut names = vec![ConceptName {
        name: wire.name.to_string(),
        locale: wire.locale.clone().unwrap_or_default(),
        preferred: true,
    }];
    names.extend(wire.names.iter().map(|n| ConceptName {
        name: n.name.to_string(),
        locale: n.locale.clone(),
        preferred: n.preferred,
    }));

    let has_numeric = wire.units.is_some()
        || wire.precise.is_some()
        || wire.hi_normal.is_some()
        || wire.low_normal.is_some();
    let numeric = (wire.datatype == ConceptDatatype::Numeric && has_numeric).then(|| {
        ConceptNumeric {
            units: wire.units.clone(),
            precise: wire.precise.unwrap_or(true),
            hi_normal: wire.hi_normal,
            low_normal: wire.low_normal,
        }
    });
    if numeric.is_none() && has_numeric {
        tracing::warn!(
            concept = %wire.uuid,
            "numeric attributes ignored on a non-numeric concept"
        );
    }

    Concept {
        uuid: wire.uuid.to_string(),
        names,
        datatype: wire.datatype,
        concept_class: wire.class.clone(),
        numeric,
        answers: wire.answers.iter().map(ToString::to_string).collect(),
        retired: wire.retired,
    }
}

fn datetime(raw: &str) -> StoreResult<DateTime<Utc>> {
    parse_datetime(raw).map_err(|e| StoreError::InvalidInput(e.to_string()))
}

fn unknown(resource: &'static str, uuid: &EntityUuid) -> StoreError {
    StoreError::UnknownReference {
        resource,
        uuid: uuid.to_string(),
    }
}

fn required<T>(
    result: Result<Option<T>, ServiceError>,
    resource: &'static str,
    uuid: &EntityUuid,
) -> StoreResult<T> {
    result?.ok_or_else(|| unknown(resource, uuid))
}

fn optional<T>(
    uuid: Option<&EntityUuid>,
    find: impl Fn(&str) -> Result<Option<T>, ServiceError>,
    resource: &'static str,
) -> StoreResult<Option<T>> {
    uuid.map(|uuid| required(find(&uuid.to_string()), resource, uuid))
        .transpose()
}
