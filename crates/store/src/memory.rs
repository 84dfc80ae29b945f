//! In-memory observation and reference store.
//!
//! Observations are kept in insertion order so searches return stable results. A group's
//! members are not copied into the group's row: each member records its group uuid, and
//! reads rebuild `group_members` from the current rows. Reference entities are immutable
//! once inserted and handed out as shared `Arc`s.

use chrono::Utc;
use obsrest_core::model::{Concept, Encounter, Location, Obs, ObsValue, Order, Person};
use obsrest_core::{ObsService, ReferenceResolver, ServiceError, ServiceResult, Services};
use obsrest_types::{Locale, NonEmptyText};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// User recorded in audit info for changes made through the store.
const DEFAULT_USER: &str = "daemon";

#[derive(Debug, Default)]
struct ObsTable {
    by_uuid: HashMap<String, Obs>,
    order: Vec<String>,
}

impl ObsTable {
    /// Stores `obs` without its embedded members. Membership lives in each member's
    /// `obs_group` and is rebuilt on read by [`ObsTable::hydrate`].
    fn put(&mut self, mut obs: Obs) {
        obs.group_members.clear();
        if !self.by_uuid.contains_key(&obs.uuid) {
            self.order.push(obs.uuid.clone());
        }
        self.by_uuid.insert(obs.uuid.clone(), obs);
    }

    fn remove(&mut self, uuid: &str) -> Option<Obs> {
        let removed = self.by_uuid.remove(uuid)?;
        self.order.retain(|u| u != uuid);
        for stored in self.by_uuid.values_mut() {
            if stored.obs_group.as_deref() == Some(uuid) {
                stored.obs_group = None;
            }
        }
        Some(removed)
    }

    /// Makes `members` the members of `group`, by uuid.
    ///
    /// Stored members only get their `obs_group` set; the rest of their state is left as
    /// stored. Members not stored yet are passed to `stamp` and stored. Rows that pointed
    /// at `group` but are no longer listed are unlinked.
    fn link_members(
        &mut self,
        group: &str,
        members: &[Arc<Obs>],
        stamp: &mut dyn FnMut(&mut Obs),
    ) {
        let listed: HashSet<&str> = members.iter().map(|m| m.uuid.as_str()).collect();
        for stored in self.by_uuid.values_mut() {
            if stored.obs_group.as_deref() == Some(group) && !listed.contains(stored.uuid.as_str())
            {
                stored.obs_group = None;
            }
        }

        for member in members {
            if let Some(stored) = self.by_uuid.get_mut(&member.uuid) {
                stored.obs_group = Some(group.to_string());
                continue;
            }
            let mut member = (**member).clone();
            member.obs_group = Some(group.to_string());
            stamp(&mut member);
            let nested = std::mem::take(&mut member.group_members);
            let uuid = member.uuid.clone();
            self.put(member);
            if !nested.is_empty() {
                self.link_members(&uuid, &nested, stamp);
            }
        }
    }

    /// Stored rows whose `obs_group` is `group`, in insertion order.
    fn members_of(&self, group: &str) -> Vec<&Obs> {
        self.order
            .iter()
            .filter_map(|uuid| self.by_uuid.get(uuid))
            .filter(|o| o.obs_group.as_deref() == Some(group))
            .collect()
    }

    /// `obs` with its group members rebuilt from the current rows.
    fn hydrate(&self, obs: &Obs) -> Obs {
        self.hydrate_on(obs, &mut Vec::new())
    }

    fn hydrate_on(&self, obs: &Obs, path: &mut Vec<String>) -> Obs {
        let mut out = obs.clone();
        path.push(obs.uuid.clone());
        let mut members = Vec::new();
        for member in self.members_of(&obs.uuid) {
            if !path.contains(&member.uuid) {
                members.push(Arc::new(self.hydrate_on(member, path)));
            }
        }
        path.pop();
        out.group_members = members;
        out
    }

    /// Uuids of `group` and every observation below it.
    fn subtree(&self, group: &str) -> Vec<String> {
        let mut found = vec![group.to_string()];
        let mut next = 0;
        while next < found.len() {
            let children: Vec<String> = self
                .members_of(&found[next])
                .into_iter()
                .map(|m| m.uuid.clone())
                .filter(|uuid| !found.contains(uuid))
                .collect();
            found.extend(children);
            next += 1;
        }
        found
    }

    fn active(&self) -> impl Iterator<Item = &Obs> + '_ {
        self.order
            .iter()
            .filter_map(|uuid| self.by_uuid.get(uuid))
            .filter(|o| !o.voided)
    }
}

#[derive(Debug, Default)]
struct References {
    concepts: HashMap<String, Arc<Concept>>,
    persons: HashMap<String, Arc<Person>>,
    encounters: HashMap<String, Arc<Encounter>>,
    locations: HashMap<String, Arc<Location>>,
    orders: HashMap<String, Arc<Order>>,
}

/// Thread-safe in-memory store implementing both service traits.
#[derive(Debug)]
pub struct MemoryStore {
    obs: RwLock<ObsTable>,
    references: RwLock<References>,
    user: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_user(DEFAULT_USER)
    }

    /// Store that records `user` as creator/changer in audit info.
    pub fn with_user(user: impl Into<String>) -> Self {
        Self {
            obs: RwLock::new(ObsTable::default()),
            references: RwLock::new(References::default()),
            user: user.into(),
        }
    }

    /// Both service handles backed by this store.
    pub fn services(self: &Arc<Self>) -> Services {
        Services::new(self.clone(), self.clone())
    }

    pub fn add_concept(&self, concept: Concept) -> ServiceResult<Arc<Concept>> {
        let concept = Arc::new(concept);
        self.write_refs()?
            .concepts
            .insert(concept.uuid.clone(), concept.clone());
        Ok(concept)
    }

    pub fn add_person(&self, person: Person) -> ServiceResult<Arc<Person>> {
        let person = Arc::new(person);
        self.write_refs()?
            .persons
            .insert(person.uuid.clone(), person.clone());
        Ok(person)
    }

    pub fn add_encounter(&self, encounter: Encounter) -> ServiceResult<Arc<Encounter>> {
        let encounter = Arc::new(encounter);
        self.write_refs()?
            .encounters
            .insert(encounter.uuid.clone(), encounter.clone());
        Ok(encounter)
    }

    pub fn add_location(&self, location: Location) -> ServiceResult<Arc<Location>> {
        let location = Arc::new(location);
        self.write_refs()?
            .locations
            .insert(location.uuid.clone(), location.clone());
        Ok(location)
    }

    pub fn add_order(&self, order: Order) -> ServiceResult<Arc<Order>> {
        let order = Arc::new(order);
        self.write_refs()?
            .orders
            .insert(order.uuid.clone(), order.clone());
        Ok(order)
    }

    /// Stores `obs` as-is, bypassing save validation. Used for seeding.
    pub fn insert_obs(&self, obs: Obs) -> ServiceResult<()> {
        let mut table = self.write_obs()?;
        table.link_members(&obs.uuid, &obs.group_members, &mut |_| {});
        table.put(obs);
        Ok(())
    }

    pub fn obs_count(&self) -> ServiceResult<usize> {
        Ok(self.read_obs()?.by_uuid.len())
    }

    fn active_matching(&self, keep: impl Fn(&Obs) -> bool) -> ServiceResult<Vec<Obs>> {
        let table = self.read_obs()?;
        Ok(table
            .active()
            .filter(|o| keep(o))
            .map(|o| table.hydrate(o))
            .collect())
    }

    fn read_obs(&self) -> ServiceResult<RwLockReadGuard<'_, ObsTable>> {
        self.obs.read().map_err(|_| poisoned())
    }

    fn write_obs(&self) -> ServiceResult<RwLockWriteGuard<'_, ObsTable>> {
        self.obs.write().map_err(|_| poisoned())
    }

    fn read_refs(&self) -> ServiceResult<RwLockReadGuard<'_, References>> {
        self.references.read().map_err(|_| poisoned())
    }

    fn write_refs(&self) -> ServiceResult<RwLockWriteGuard<'_, References>> {
        self.references.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> ServiceError {
    ServiceError::Storage("store lock poisoned".into())
}

/// Mandatory data checked before an observation is persisted.
fn validate(obs: &Obs) -> ServiceResult<()> {
    if obs.concept.is_none() {
        return Err(ServiceError::Validation("concept is required".into()));
    }
    if obs.person.is_none() {
        return Err(ServiceError::Validation("person is required".into()));
    }
    if obs.obs_datetime.is_none() {
        return Err(ServiceError::Validation("obsDatetime is required".into()));
    }
    if !obs.is_obs_grouping() && obs.value == ObsValue::Empty {
        return Err(ServiceError::Validation(
            "an observation that is not a group must have a value".into(),
        ));
    }
    Ok(())
}

fn matches_query(obs: &Obs, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let concept_hit = obs.concept.as_ref().is_some_and(|c| {
        c.names
            .iter()
            .any(|n| n.name.to_lowercase().contains(query))
    });
    let person_hit = obs.person.as_ref().is_some_and(|p| {
        p.names
            .iter()
            .any(|n| n.full_name().to_lowercase().contains(query))
    });
    let comment_hit = obs
        .comment
        .as_ref()
        .is_some_and(|c| c.to_lowercase().contains(query));
    concept_hit || person_hit || comment_hit
}

impl ObsService for MemoryStore {
    fn get_obs_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Obs>> {
        let table = self.read_obs()?;
        Ok(table.by_uuid.get(uuid).map(|o| table.hydrate(o)))
    }

    /// Persists `obs`. Group members are linked by uuid; a member that is already stored
    /// keeps its own stored state.
    fn save_obs(&self, mut obs: Obs, reason: &str) -> ServiceResult<Obs> {
        validate(&obs)?;
        let now = Utc::now();
        let user = self.user.as_str();
        obs.audit.touch(user, now);

        let mut table = self.write_obs()?;
        table.link_members(&obs.uuid, &obs.group_members, &mut |member| {
            if member.audit.date_created.is_none() {
                member.audit.touch(user, now);
            }
        });
        let saved = table.hydrate(&obs);
        table.put(obs);
        tracing::debug!(uuid = %saved.uuid, reason, "saved obs");
        Ok(saved)
    }

    /// Voids `obs` and every observation below it.
    fn void_obs(&self, obs: &Obs, reason: &NonEmptyText) -> ServiceResult<Obs> {
        let now = Utc::now();
        let mut table = self.write_obs()?;
        if !table.by_uuid.contains_key(&obs.uuid) {
            return Err(ServiceError::NotFound(format!("obs {}", obs.uuid)));
        }

        for uuid in table.subtree(&obs.uuid) {
            if let Some(stored) = table.by_uuid.get_mut(&uuid) {
                stored.voided = true;
                stored.void_reason = Some(reason.to_string());
                stored.audit.touch(self.user.as_str(), now);
            }
        }
        tracing::debug!(uuid = %obs.uuid, %reason, "voided obs");
        table
            .by_uuid
            .get(&obs.uuid)
            .map(|stored| table.hydrate(stored))
            .ok_or_else(|| ServiceError::NotFound(format!("obs {}", obs.uuid)))
    }

    /// Removes `obs`. Its members stay stored, unlinked from it.
    fn purge_obs(&self, obs: &Obs) -> ServiceResult<()> {
        self.write_obs()?
            .remove(&obs.uuid)
            .map(|_| tracing::debug!(uuid = %obs.uuid, "purged obs"))
            .ok_or_else(|| ServiceError::NotFound(format!("obs {}", obs.uuid)))
    }

    /// Case-insensitive match on concept name, person name or comment. An empty query
    /// matches every non-voided observation.
    fn get_observations(&self, query: &str) -> ServiceResult<Vec<Obs>> {
        let query = query.trim().to_lowercase();
        self.active_matching(|o| matches_query(o, &query))
    }

    fn get_observations_by_person(&self, person: &Person) -> ServiceResult<Vec<Obs>> {
        self.active_matching(|o| o.person.as_ref().is_some_and(|p| p.uuid == person.uuid))
    }

    fn get_observations_by_encounter(&self, encounter: &Encounter) -> ServiceResult<Vec<Obs>> {
        self.active_matching(|o| {
            o.encounter
                .as_ref()
                .is_some_and(|e| e.uuid == encounter.uuid)
        })
    }
}

impl ReferenceResolver for MemoryStore {
    fn concept_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Concept>>> {
        Ok(self.read_refs()?.concepts.get(uuid).cloned())
    }

    fn person_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Person>>> {
        Ok(self.read_refs()?.persons.get(uuid).cloned())
    }

    fn encounter_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Encounter>>> {
        Ok(self.read_refs()?.encounters.get(uuid).cloned())
    }

    fn location_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Location>>> {
        Ok(self.read_refs()?.locations.get(uuid).cloned())
    }

    fn order_by_uuid(&self, uuid: &str) -> ServiceResult<Option<Arc<Order>>> {
        Ok(self.read_refs()?.orders.get(uuid).cloned())
    }
}

impl MemoryStore {
    /// Concepts whose name in `locale` contains `fragment`, case-insensitively.
    pub fn find_concepts(
        &self,
        fragment: &str,
        locale: &Locale,
    ) -> ServiceResult<Vec<Arc<Concept>>> {
        let fragment = fragment.to_lowercase();
        let refs = self.read_refs()?;
        let mut found: Vec<_> = refs
            .concepts
            .values()
            .filter(|c| {
                c.name(locale)
                    .is_some_and(|n| n.to_lowercase().contains(&fragment))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use obsrest_core::model::{ConceptDatatype, ConceptName, PersonName};
    use obsrest_core::{default_registry, project, CoreConfig, Representation, RequestContext};
    use serde_json::json;

    const HB: &str = "c0000000-0000-4000-8000-000000000001";
    const PATIENT: &str = "a0000000-0000-4000-8000-000000000001";

    fn store() -> MemoryStore {
        let store = MemoryStore::with_user("tester");
        store
            .add_concept(Concept {
                uuid: HB.into(),
                names: vec![ConceptName {
                    name: "Haemoglobin".into(),
                    locale: Locale::default(),
                    preferred: true,
                }],
                datatype: ConceptDatatype::Numeric,
                concept_class: "Test".into(),
                numeric: None,
                answers: Vec::new(),
                retired: false,
            })
            .unwrap();
        store
            .add_person(Person {
                uuid: PATIENT.into(),
                names: vec![PersonName {
                    given_name: "Jane".into(),
                    family_name: "Doe".into(),
                    preferred: true,
                    ..Default::default()
                }],
                is_patient: true,
                ..Default::default()
            })
            .unwrap();
        store
    }

    fn valid_obs(store: &MemoryStore, value: f64) -> Obs {
        Obs {
            person: store.person_by_uuid(PATIENT).unwrap(),
            concept: store.concept_by_uuid(HB).unwrap(),
            value: ObsValue::Numeric(value),
            obs_datetime: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn save_requires_mandatory_fields() {
        let store = store();
        let mut obs = valid_obs(&store, 1.0);
        obs.person = None;
        assert!(matches!(
            store.save_obs(obs, "test"),
            Err(ServiceError::Validation(_))
        ));

        let mut obs = valid_obs(&store, 1.0);
        obs.value = ObsValue::Empty;
        assert!(matches!(
            store.save_obs(obs, "test"),
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(store.obs_count().unwrap(), 0);
    }

    #[test]
    fn save_records_audit_info() {
        let store = store();
        let saved = store.save_obs(valid_obs(&store, 1.0), "test").unwrap();
        assert_eq!(saved.audit.creator.as_deref(), Some("tester"));
        assert!(saved.audit.date_created.is_some());

        let resaved = store.save_obs(saved, "test").unwrap();
        assert_eq!(resaved.audit.changed_by.as_deref(), Some("tester"));
    }

    #[test]
    fn void_hides_from_search_but_not_from_lookup() {
        let store = store();
        let saved = store.save_obs(valid_obs(&store, 1.0), "test").unwrap();
        let reason = NonEmptyText::new("wrong patient").unwrap();

        let voided = store.void_obs(&saved, &reason).unwrap();
        assert!(voided.voided);
        assert!(store.get_observations("").unwrap().is_empty());
        assert!(store.get_obs_by_uuid(&saved.uuid).unwrap().unwrap().voided);
    }

    #[test]
    fn void_cascades_to_members() {
        let store = store();
        let a = store.save_obs(valid_obs(&store, 1.0), "test").unwrap();
        let b = store.save_obs(valid_obs(&store, 2.0), "test").unwrap();
        let group = store
            .save_obs(
                Obs {
                    value: ObsValue::Empty,
                    group_members: vec![Arc::new(a.clone()), Arc::new(b.clone())],
                    ..valid_obs(&store, 0.0)
                },
                "test",
            )
            .unwrap();

        store
            .void_obs(&group, &NonEmptyText::new("duplicate").unwrap())
            .unwrap();
        assert!(store.get_obs_by_uuid(&a.uuid).unwrap().unwrap().voided);
        assert!(store.get_obs_by_uuid(&b.uuid).unwrap().unwrap().voided);
    }

    fn save_group(store: &MemoryStore, members: &[&Obs]) -> Obs {
        store
            .save_obs(
                Obs {
                    value: ObsValue::Empty,
                    group_members: members.iter().map(|m| Arc::new((*m).clone())).collect(),
                    ..valid_obs(store, 0.0)
                },
                "test",
            )
            .unwrap()
    }

    #[test]
    fn resaving_a_group_keeps_member_changes() {
        let store = store();
        let a = store.save_obs(valid_obs(&store, 1.0), "test").unwrap();
        let b = store.save_obs(valid_obs(&store, 2.0), "test").unwrap();
        let group = save_group(&store, &[&a, &b]);

        let mut changed = store.get_obs_by_uuid(&a.uuid).unwrap().unwrap();
        changed.value = ObsValue::Numeric(99.0);
        let changed = store.save_obs(changed, "test").unwrap();
        store
            .void_obs(&changed, &NonEmptyText::new("entered in error").unwrap())
            .unwrap();

        let mut group = store.get_obs_by_uuid(&group.uuid).unwrap().unwrap();
        group.comment = Some("reviewed".into());
        store.save_obs(group, "test").unwrap();

        let a = store.get_obs_by_uuid(&a.uuid).unwrap().unwrap();
        assert_eq!(a.value, ObsValue::Numeric(99.0));
        assert!(a.voided);
        assert_eq!(a.void_reason.as_deref(), Some("entered in error"));
    }

    #[test]
    fn group_reads_current_member_state() {
        let store = store();
        let a = store.save_obs(valid_obs(&store, 1.0), "test").unwrap();
        let b = store.save_obs(valid_obs(&store, 2.0), "test").unwrap();
        let group = save_group(&store, &[&a, &b]);

        let mut changed = store.get_obs_by_uuid(&a.uuid).unwrap().unwrap();
        changed.value = ObsValue::Numeric(99.0);
        store.save_obs(changed, "test").unwrap();

        let stored = store.get_obs_by_uuid(&group.uuid).unwrap().unwrap();
        assert_eq!(stored.group_members.len(), 2);
        assert_eq!(stored.group_members[0].value, ObsValue::Numeric(99.0));
        assert!(stored
            .group_members
            .iter()
            .all(|m| m.obs_group.as_deref() == Some(group.uuid.as_str())));
    }

    #[test]
    fn voided_group_renders_voided_members() {
        let store = Arc::new(store());
        let a = store.save_obs(valid_obs(&store, 1.0), "test").unwrap();
        let b = store.save_obs(valid_obs(&store, 2.0), "test").unwrap();
        let group = save_group(&store, &[&a, &b]);
        store
            .void_obs(&group, &NonEmptyText::new("duplicate").unwrap())
            .unwrap();

        let config = CoreConfig::default();
        let registry = default_registry().unwrap();
        let services = store.services();
        let ctx = RequestContext::new(&config, &registry, &services);
        let stored = store.get_obs_by_uuid(&group.uuid).unwrap().unwrap();
        let out = project(&stored, Representation::Full, &ctx).unwrap();

        assert_eq!(out["voided"], json!(true));
        let members = out["groupMembers"].as_array().unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.iter().all(|m| m["voided"] == json!(true)));
    }

    #[test]
    fn dropping_a_member_unlinks_it() {
        let store = store();
        let a = store.save_obs(valid_obs(&store, 1.0), "test").unwrap();
        let b = store.save_obs(valid_obs(&store, 2.0), "test").unwrap();
        let c = store.save_obs(valid_obs(&store, 3.0), "test").unwrap();
        let group = save_group(&store, &[&a, &b, &c]);

        let mut group = store.get_obs_by_uuid(&group.uuid).unwrap().unwrap();
        group.group_members.retain(|m| m.uuid != c.uuid);
        let saved = store.save_obs(group, "test").unwrap();

        assert_eq!(saved.group_members.len(), 2);
        assert!(store.get_obs_by_uuid(&c.uuid).unwrap().unwrap().obs_group.is_none());
    }

    #[test]
    fn purging_a_group_unlinks_members() {
        let store = store();
        let a = store.save_obs(valid_obs(&store, 1.0), "test").unwrap();
        let b = store.save_obs(valid_obs(&store, 2.0), "test").unwrap();
        let group = save_group(&store, &[&a, &b]);

        store.purge_obs(&group).unwrap();
        assert!(store.get_obs_by_uuid(&group.uuid).unwrap().is_none());
        assert!(store.get_obs_by_uuid(&a.uuid).unwrap().unwrap().obs_group.is_none());
        assert_eq!(store.obs_count().unwrap(), 2);
    }

    #[test]
    fn search_matches_concept_person_and_comment() {
        let store = store();
        let mut obs = valid_obs(&store, 1.0);
        obs.comment = Some("Fasting sample".into());
        store.save_obs(obs, "test").unwrap();

        assert_eq!(store.get_observations("haemo").unwrap().len(), 1);
        assert_eq!(store.get_observations("JANE").unwrap().len(), 1);
        assert_eq!(store.get_observations("fasting").unwrap().len(), 1);
        assert!(store.get_observations("glucose").unwrap().is_empty());
    }

    #[test]
    fn purge_missing_is_not_found() {
        let store = store();
        let obs = valid_obs(&store, 1.0);
        assert!(matches!(
            store.purge_obs(&obs),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn patient_lookup_filters_non_patients() {
        let store = store();
        let other = store
            .add_person(Person {
                uuid: "a0000000-0000-4000-8000-000000000002".into(),
                ..Default::default()
            })
            .unwrap();
        assert!(store.patient_by_uuid(PATIENT).unwrap().is_some());
        assert!(store.patient_by_uuid(&other.uuid).unwrap().is_none());
        assert!(store.person_by_uuid(&other.uuid).unwrap().is_some());
    }

    #[test]
    fn find_concepts_by_name_fragment() {
        let store = store();
        let found = store.find_concepts("GLOB", &Locale::default()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uuid, HB);
    }
}
