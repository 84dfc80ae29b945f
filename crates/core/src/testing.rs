//! In-crate fakes and fixtures for unit tests.

use crate::config::CoreConfig;
use crate::context::RequestContext;
use crate::model::{
    Concept, ConceptDatatype, ConceptName, ConceptNumeric, Encounter, Location, Obs, ObsValue,
    Order, Person, PersonName,
};
use crate::resource::ResourceRegistry;
use crate::resources::default_registry;
use crate::services::{ObsService, ReferenceResolver, ServiceError, ServiceResult, Services};
use chrono::{TimeZone, Utc};
use obsrest_types::{Locale, NonEmptyText};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const HB: &str = "c0000000-0000-4000-8000-000000000001";
pub const DOSE: &str = "c0000000-0000-4000-8000-000000000002";
pub const HIV_RESULT: &str = "c0000000-0000-4000-8000-000000000003";
pub const POSITIVE: &str = "c0000000-0000-4000-8000-000000000004";
pub const NEGATIVE: &str = "c0000000-0000-4000-8000-000000000005";
pub const NOTE: &str = "c0000000-0000-4000-8000-000000000006";
pub const VITALS: &str = "c0000000-0000-4000-8000-000000000007";
pub const PATIENT: &str = "a0000000-0000-4000-8000-000000000001";
pub const NON_PATIENT: &str = "a0000000-0000-4000-8000-000000000002";
pub const ENCOUNTER: &str = "e0000000-0000-4000-8000-000000000001";
pub const LOCATION: &str = "10000000-0000-4000-8000-000000000001";
pub const ORDER: &str = "0d000000-0000-4000-8000-000000000001";

#[derive(Default)]
pub struct FakeObsService {
    obs: Mutex<HashMap<String, Obs>>,
    insertion: Mutex<Vec<String>>,
    void_calls: AtomicUsize,
    save_calls: AtomicUsize,
}

impl FakeObsService {
    pub fn insert(&self, obs: Obs) {
        let mut order = self.insertion.lock().unwrap();
        if !order.contains(&obs.uuid) {
            order.push(obs.uuid.clone());
        }
        self.obs.lock().unwrap().insert(obs.uuid.clone(), obs);
    }

    pub fn void_calls(&self) -> usize {
        self.void_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    fn all(&self) -> Vec<Obs> {
        let map = self.obs.lock().unwrap();
        self.insertion
            .lock()
            .unwrap()
            .iter()
            .filter_map(|uuid| map.get(uuid).cloned())
            .collect()
    }
}

impl ObsService for FakeObsService {
    fn get_obs_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Obs>> {
        Ok(self.obs.lock().unwrap().get(uuid).cloned())
    }

    fn save_obs(&self, obs: Obs, _reason: &str) -> ServiceResult<Obs> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if obs.concept.is_none() {
            return Err(ServiceError::Validation("concept is required".into()));
        }
        self.insert(obs.clone());
        Ok(obs)
    }

    fn void_obs(&self, obs: &Obs, reason: &NonEmptyText) -> ServiceResult<Obs> {
        self.void_calls.fetch_add(1, Ordering::SeqCst);
        let mut voided = obs.clone();
        voided.voided = true;
        voided.void_reason = Some(reason.to_string());
        self.insert(voided.clone());
        Ok(voided)
    }

    fn purge_obs(&self, obs: &Obs) -> ServiceResult<()> {
        self.obs.lock().unwrap().remove(&obs.uuid);
        self.insertion.lock().unwrap().retain(|u| u != &obs.uuid);
        Ok(())
    }

    fn get_observations(&self, query: &str) -> ServiceResult<Vec<Obs>> {
        let query = query.to_lowercase();
        Ok(self
            .all()
            .into_iter()
            .filter(|o| {
                o.concept.as_ref().is_some_and(|c| {
                    c.names.iter().any(|n| n.name.to_lowercase().contains(&query))
                })
            })
            .collect())
    }

    fn get_observations_by_person(&self, person: &Person) -> ServiceResult<Vec<Obs>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|o| o.person.as_ref().is_some_and(|p| p.uuid == person.uuid))
            .collect())
    }

    fn get_observations_by_encounter(&self, encounter: &Encounter) -> ServiceResult<Vec<Obs>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|o| o.encounter.as_ref().is_some_and(|e| e.uuid == encounter.uuid))
            .collect())
    }
}

#[derive(Default)]
pub struct FakeReferences {
    pub concepts: HashMap<String, Arc<Concept>>,
    pub persons: HashMap<String, Arc<Person>>,
    pub encounters: HashMap<String, Arc<Encounter>>,
    pub locations: HashMap<String, Arc<Location>>,
    pub orders: HashMap<String, Arc<Order>>,
}

impl ReferenceResolver for FakeReferences {
    fn concept_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Concept>>> {
        Ok(self.concepts.get(uuid).cloned())
    }

    fn person_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Person>>> {
        Ok(self.persons.get(uuid).cloned())
    }

    fn encounter_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Encounter>>> {
        Ok(self.encounters.get(uuid).cloned())
    }

    fn location_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Location>>> {
        Ok(self.locations.get(uuid).cloned())
    }

    fn order_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Order>>> {
        Ok(self.orders.get(uuid).cloned())
    }
}

fn concept(
    uuid: &str,
    name: &str,
    datatype: ConceptDatatype,
    numeric: Option<ConceptNumeric>,
) -> Arc<Concept> {
    Arc::new(Concept {
        uuid: uuid.into(),
        names: vec![ConceptName {
            name: name.into(),
            locale: Locale::default(),
            preferred: true,
        }],
        datatype,
        concept_class: "Test".into(),
        numeric,
        answers: Vec::new(),
        retired: false,
    })
}

fn units(units: &str) -> Option<ConceptNumeric> {
    Some(ConceptNumeric {
        units: Some(units.into()),
        precise: true,
        ..Default::default()
    })
}

/// Config, registry and fake services wired together, with a small vocabulary.
pub struct Harness {
    pub config: CoreConfig,
    pub registry: ResourceRegistry,
    pub services: Services,
    pub obs: Arc<FakeObsService>,
    pub references: Arc<FakeReferences>,
}

impl Harness {
    pub fn new() -> Self {
        let mut refs = FakeReferences::default();
        let mut hiv =
            (*concept(HIV_RESULT, "HIV test result", ConceptDatatype::Coded, None)).clone();
        hiv.answers = vec![POSITIVE.into(), NEGATIVE.into()];
        for c in [
            concept(HB, "Haemoglobin", ConceptDatatype::Numeric, units("g/dL")),
            concept(DOSE, "Dose", ConceptDatatype::Numeric, units("mg")),
            Arc::new(hiv),
            concept(POSITIVE, "POSITIVE", ConceptDatatype::NotApplicable, None),
            concept(NEGATIVE, "NEGATIVE", ConceptDatatype::NotApplicable, None),
            concept(NOTE, "Clinical note", ConceptDatatype::Text, None),
            concept(VITALS, "Vitals", ConceptDatatype::NotApplicable, None),
        ] {
            refs.concepts.insert(c.uuid.clone(), c);
        }

        let patient = Arc::new(Person {
            uuid: PATIENT.into(),
            names: vec![PersonName {
                given_name: "Jane".into(),
                family_name: "Doe".into(),
                preferred: true,
                ..Default::default()
            }],
            gender: Some("F".into()),
            is_patient: true,
            ..Default::default()
        });
        let non_patient = Arc::new(Person {
            uuid: NON_PATIENT.into(),
            ..Default::default()
        });
        let location = Arc::new(Location {
            uuid: LOCATION.into(),
            name: "Outpatient clinic".into(),
            ..Default::default()
        });
        let encounter = Arc::new(Encounter {
            uuid: ENCOUNTER.into(),
            encounter_type: "Adult visit".into(),
            encounter_datetime: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            patient: Some(patient.clone()),
            location: Some(location.clone()),
            voided: false,
        });
        let order = Arc::new(Order {
            uuid: ORDER.into(),
            concept: refs.concepts.get(HB).cloned(),
            patient: Some(patient.clone()),
            ..Default::default()
        });
        refs.persons.insert(PATIENT.into(), patient);
        refs.persons.insert(NON_PATIENT.into(), non_patient);
        refs.locations.insert(LOCATION.into(), location);
        refs.encounters.insert(ENCOUNTER.into(), encounter);
        refs.orders.insert(ORDER.into(), order);

        let obs = Arc::new(FakeObsService::default());
        let references = Arc::new(refs);
        let services = Services::new(obs.clone(), references.clone());

        Self {
            config: CoreConfig::default(),
            registry: default_registry().unwrap(),
            services,
            obs,
            references,
        }
    }

    pub fn ctx(&self) -> RequestContext<'_> {
        RequestContext::new(&self.config, &self.registry, &self.services)
    }

    pub fn concept(&self, uuid: &str) -> Arc<Concept> {
        self.references.concepts[uuid].clone()
    }

    pub fn patient(&self) -> Arc<Person> {
        self.references.persons[PATIENT].clone()
    }

    pub fn encounter(&self) -> Arc<Encounter> {
        self.references.encounters[ENCOUNTER].clone()
    }

    /// A stored numeric observation for the fixture patient.
    pub fn numeric_obs(&self, uuid: &str, value: f64) -> Obs {
        let obs = Obs {
            uuid: uuid.into(),
            person: Some(self.patient()),
            concept: Some(self.concept(HB)),
            value: ObsValue::Numeric(value),
            obs_datetime: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()),
            encounter: Some(self.encounter()),
            ..Default::default()
        };
        self.obs.insert(obs.clone());
        obs
    }
}
