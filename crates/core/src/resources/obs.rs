//! The observation resource.
//!
//! Most properties are plain field access. `value`, `groupMembers` and `concept` are
//! overridden: the value is rendered and parsed through the concept's datatype, group
//! members are only exposed for real groups, and an unknown concept is assigned silently
//! so that persistence reports it.

use crate::accessor::{FieldTable, Overrides, PropertyValue};
use crate::constants::SAVE_REASON;
use crate::context::RequestContext;
use crate::conversion::{
    expect_bool, expect_string, format_datetime, optional_string, parse_datetime, reference_uuid,
};
use crate::description::ResourceDescription;
use crate::model::Obs;
use crate::paging::PagedResult;
use crate::pipeline::DataResource;
use crate::representation::Representation;
use crate::resource::Resource;
use crate::{ReprError, ReprResult};
use obsrest_types::NonEmptyText;
use obsrest_uuid::EntityUuid;
use serde_json::Value;
use std::sync::Arc;

impl Resource for Obs {
    const NAME: &'static str = "obs";

    fn uuid(&self) -> &str {
        &self.uuid
    }

    /// `"<concept name> = <value>"`, or empty when the concept is not set.
    fn display(&self, ctx: &RequestContext<'_>) -> String {
        match &self.concept {
            Some(concept) => format!(
                "{} = {}",
                concept.name(ctx.locale()).unwrap_or_default(),
                self.value_as_string(ctx.locale())
            ),
            None => String::new(),
        }
    }

    fn description(representation: Representation) -> Option<ResourceDescription> {
        match representation {
            Representation::Default => Some(
                ResourceDescription::new()
                    .property("uuid")
                    .property("display")
                    .nested("person", Representation::Ref)
                    .nested("concept", Representation::Ref)
                    .property("value")
                    .property("obsDatetime")
                    .property("accessionNumber")
                    .nested("obsGroup", Representation::Ref)
                    .property("groupMembers")
                    .property("comment")
                    .nested("location", Representation::Ref)
                    .nested("order", Representation::Ref)
                    .nested("encounter", Representation::Ref)
                    .property("voided")
                    .self_link()
                    .link("full", ".?v=full"),
            ),
            Representation::Full => Some(
                ResourceDescription::new()
                    .property("uuid")
                    .property("display")
                    .nested("person", Representation::Ref)
                    .property("concept")
                    .property("value")
                    .property("obsDatetime")
                    .property("accessionNumber")
                    .property("obsGroup")
                    .nested("groupMembers", Representation::Full)
                    .property("comment")
                    .property("location")
                    .property("order")
                    .property("encounter")
                    .property("voided")
                    .property("auditInfo")
                    .self_link(),
            ),
            Representation::Ref => None,
        }
    }

    fn fields() -> FieldTable<Self> {
        FieldTable::<Obs>::new()
            .field(
                "uuid",
                |o, _| Ok(PropertyValue::scalar(o.uuid.as_str())),
                |o, v, _| {
                    o.uuid = EntityUuid::parse(&expect_string("uuid", &v)?)?.to_string();
                    Ok(())
                },
            )
            .read_only("display", |o, ctx| {
                Ok(PropertyValue::scalar(Resource::display(o, ctx)))
            })
            .field(
                "person",
                |o, _| Ok(PropertyValue::entity(o.person.as_ref())),
                |o, v, ctx| {
                    let uuid = reference_uuid("person", &v)?.to_string();
                    o.person = Some(
                        ctx.services()
                            .references
                            .person_by_uuid(&uuid)?
                            .ok_or_else(|| missing_reference("person", &uuid))?,
                    );
                    Ok(())
                },
            )
            .read_only("concept", |o, _| Ok(PropertyValue::entity(o.concept.as_ref())))
            .field(
                "obsDatetime",
                |o, _| {
                    Ok(PropertyValue::optional(
                        o.obs_datetime.as_ref().map(format_datetime),
                    ))
                },
                |o, v, _| {
                    o.obs_datetime = match optional_string("obsDatetime", &v)? {
                        Some(raw) => Some(parse_datetime(&raw)?),
                        None => None,
                    };
                    Ok(())
                },
            )
            .field(
                "accessionNumber",
                |o, _| Ok(PropertyValue::optional(o.accession_number.clone())),
                |o, v, _| {
                    o.accession_number = optional_string("accessionNumber", &v)?;
                    Ok(())
                },
            )
            .field("obsGroup", get_obs_group, set_obs_group)
            .field(
                "groupMembers",
                |o, _| Ok(PropertyValue::entities(&o.group_members)),
                set_group_members,
            )
            .field(
                "comment",
                |o, _| Ok(PropertyValue::optional(o.comment.clone())),
                |o, v, _| {
                    o.comment = optional_string("comment", &v)?;
                    Ok(())
                },
            )
            .field(
                "location",
                |o, _| Ok(PropertyValue::entity(o.location.as_ref())),
                |o, v, ctx| {
                    let uuid = reference_uuid("location", &v)?.to_string();
                    o.location = Some(
                        ctx.services()
                            .references
                            .location_by_uuid(&uuid)?
                            .ok_or_else(|| missing_reference("location", &uuid))?,
                    );
                    Ok(())
                },
            )
            .field(
                "order",
                |o, _| Ok(PropertyValue::entity(o.order.as_ref())),
                |o, v, ctx| {
                    let uuid = reference_uuid("order", &v)?.to_string();
                    o.order = Some(
                        ctx.services()
                            .references
                            .order_by_uuid(&uuid)?
                            .ok_or_else(|| missing_reference("order", &uuid))?,
                    );
                    Ok(())
                },
            )
            .field(
                "encounter",
                |o, _| Ok(PropertyValue::entity(o.encounter.as_ref())),
                |o, v, ctx| {
                    let uuid = reference_uuid("encounter", &v)?.to_string();
                    o.encounter = Some(
                        ctx.services()
                            .references
                            .encounter_by_uuid(&uuid)?
                            .ok_or_else(|| missing_reference("encounter", &uuid))?,
                    );
                    Ok(())
                },
            )
            .field(
                "voided",
                |o, _| Ok(PropertyValue::scalar(o.voided)),
                |o, v, _| {
                    o.voided = expect_bool("voided", &v)?;
                    Ok(())
                },
            )
            .read_only("auditInfo", |o, _| Ok(PropertyValue::Scalar(o.audit.to_value())))
    }

    fn overrides() -> Overrides<Self> {
        Overrides::new()
            .getter("value", get_value)
            .setter("value", set_value)
            .getter("groupMembers", get_group_members)
            .setter("concept", set_concept)
    }
}

/// Grouping observations have no value of their own.
fn get_value(obs: &Obs, ctx: &RequestContext<'_>) -> ReprResult<PropertyValue> {
    if obs.is_obs_grouping() {
        return Ok(PropertyValue::Absent);
    }
    Ok(PropertyValue::scalar(obs.value_as_string(ctx.locale())))
}

/// Sets the value according to the concept's datatype.
///
/// Coded values are answer concept uuids. For numeric concepts with units a trailing unit
/// suffix is stripped; a value without the suffix must still be a plain number.
fn set_value(obs: &mut Obs, value: Value, ctx: &RequestContext<'_>) -> ReprResult<()> {
    if value.is_null() {
        return Err(ReprError::InvalidInput(
            "The value for an observation cannot be null".into(),
        ));
    }
    let concept = obs
        .concept
        .clone()
        .ok_or_else(|| ReprError::InvalidInput("concept must be set before value".into()))?;

    if concept.datatype.is_coded() {
        let uuid = reference_uuid("value", &value)?.to_string();
        let answer = ctx
            .services()
            .references
            .concept_by_uuid(&uuid)?
            .ok_or_else(|| missing_reference("concept", &uuid))?;
        obs.set_value_coded(answer);
        return Ok(());
    }

    let raw = expect_string("value", &value)?;
    if let Some(units) = concept.units().filter(|_| concept.is_numeric()) {
        let trimmed = raw.trim();
        let number = match trimmed.strip_suffix(units) {
            Some(stripped) => stripped.trim(),
            None => {
                if trimmed.parse::<f64>().is_err() {
                    return Err(ReprError::InvalidInput(format!(
                        "{trimmed} has invalid units"
                    )));
                }
                trimmed
            }
        };
        return obs.set_value_as_string(number);
    }

    obs.set_value_as_string(&raw)
}

/// Members are only exposed for groups of two or more.
fn get_group_members(obs: &Obs, _ctx: &RequestContext<'_>) -> ReprResult<PropertyValue> {
    if obs.group_members.len() > 1 {
        Ok(PropertyValue::entities(&obs.group_members))
    } else {
        Ok(PropertyValue::Absent)
    }
}

/// An unknown concept leaves the observation without one; saving then fails validation.
fn set_concept(obs: &mut Obs, value: Value, ctx: &RequestContext<'_>) -> ReprResult<()> {
    let uuid = reference_uuid("concept", &value)?.to_string();
    obs.concept = ctx.services().references.concept_by_uuid(&uuid)?;
    if obs.concept.is_none() {
        tracing::debug!(concept = %uuid, "concept not found; left unset");
    }
    Ok(())
}

fn get_obs_group(obs: &Obs, ctx: &RequestContext<'_>) -> ReprResult<PropertyValue> {
    let Some(parent) = obs.obs_group.as_deref() else {
        return Ok(PropertyValue::Absent);
    };
    match ctx.services().obs.get_obs_by_uuid(parent)? {
        Some(group) => Ok(PropertyValue::Entity(Arc::new(group))),
        None => {
            tracing::debug!(obs = %obs.uuid, group = %parent, "obs group not found");
            Ok(PropertyValue::Absent)
        }
    }
}

fn set_obs_group(obs: &mut Obs, value: Value, ctx: &RequestContext<'_>) -> ReprResult<()> {
    if value.is_null() {
        obs.obs_group = None;
        return Ok(());
    }
    let uuid = reference_uuid("obsGroup", &value)?.to_string();
    if ctx.services().obs.get_obs_by_uuid(&uuid)?.is_none() {
        return Err(missing_reference("obs", &uuid));
    }
    obs.obs_group = Some(uuid);
    Ok(())
}

fn set_group_members(obs: &mut Obs, value: Value, ctx: &RequestContext<'_>) -> ReprResult<()> {
    let Value::Array(items) = value else {
        return Err(ReprError::InvalidInput(
            "groupMembers must be a list of observations".into(),
        ));
    };
    let mut members = Vec::with_capacity(items.len());
    for item in &items {
        let uuid = reference_uuid("groupMembers", item)?.to_string();
        let mut member = ctx
            .services()
            .obs
            .get_obs_by_uuid(&uuid)?
            .ok_or_else(|| missing_reference("obs", &uuid))?;
        member.obs_group = Some(obs.uuid.clone());
        members.push(Arc::new(member));
    }
    obs.group_members = members;
    Ok(())
}

fn missing_reference(resource: &str, uuid: &str) -> ReprError {
    ReprError::InvalidInput(format!("{resource} {uuid} not found"))
}

impl DataResource for Obs {
    fn setter_order() -> &'static [&'static str] {
        &["concept", "value"]
    }

    fn new_delegate() -> Self {
        Obs::default()
    }

    fn is_voided(&self) -> bool {
        self.voided
    }

    fn get_by_uuid(uuid: &str, ctx: &RequestContext<'_>) -> ReprResult<Option<Self>> {
        Ok(ctx.services().obs.get_obs_by_uuid(uuid)?)
    }

    fn save(self, ctx: &RequestContext<'_>) -> ReprResult<Self> {
        Ok(ctx.services().obs.save_obs(self, SAVE_REASON)?)
    }

    fn void(&self, reason: &NonEmptyText, ctx: &RequestContext<'_>) -> ReprResult<Self> {
        Ok(ctx.services().obs.void_obs(self, reason)?)
    }

    fn purge(&self, ctx: &RequestContext<'_>) -> ReprResult<()> {
        Ok(ctx.services().obs.purge_obs(self)?)
    }

    fn search(query: &str, ctx: &RequestContext<'_>) -> ReprResult<Vec<Self>> {
        Ok(ctx.services().obs.get_observations(query)?)
    }
}

/// Observations recorded during an encounter, paged by the context.
pub fn obs_by_encounter(
    encounter_uuid: &str,
    ctx: &RequestContext<'_>,
) -> ReprResult<PagedResult<Obs>> {
    let encounter = ctx
        .services()
        .references
        .encounter_by_uuid(encounter_uuid)?
        .ok_or_else(|| ReprError::NotFound {
            resource: "encounter",
            id: encounter_uuid.to_string(),
        })?;
    let all = ctx.services().obs.get_observations_by_encounter(&encounter)?;
    Ok(PagedResult::paginate(all, ctx.paging()))
}

/// Observations about a patient, paged by the context.
pub fn obs_by_patient(
    patient_uuid: &str,
    ctx: &RequestContext<'_>,
) -> ReprResult<PagedResult<Obs>> {
    let patient = ctx
        .services()
        .references
        .patient_by_uuid(patient_uuid)?
        .ok_or_else(|| ReprError::NotFound {
            resource: "patient",
            id: patient_uuid.to_string(),
        })?;
    let all = ctx.services().obs.get_observations_by_person(&patient)?;
    Ok(PagedResult::paginate(all, ctx.paging()))
}
