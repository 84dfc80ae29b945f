use crate::accessor::{FieldTable, PropertyValue};
use crate::context::RequestContext;
use crate::description::ResourceDescription;
use crate::model::Person;
use crate::representation::Representation;
use crate::resource::Resource;
use serde_json::{json, Value};

impl Resource for Person {
    const NAME: &'static str = "person";

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn display(&self, _ctx: &RequestContext<'_>) -> String {
        self.preferred_name()
            .map(|n| n.full_name())
            .unwrap_or_default()
    }

    fn description(representation: Representation) -> Option<ResourceDescription> {
        let base = ResourceDescription::new()
            .property("uuid")
            .property("display")
            .property("gender")
            .property("birthdate")
            .property("voided");
        match representation {
            Representation::Default => Some(base.self_link().link("full", ".?v=full")),
            Representation::Full => Some(
                base.property("names")
                    .property("auditInfo")
                    .self_link(),
            ),
            Representation::Ref => None,
        }
    }

    fn fields() -> FieldTable<Self> {
        FieldTable::<Person>::new()
            .read_only("uuid", |p, _| Ok(PropertyValue::scalar(p.uuid.as_str())))
            .read_only("display", |p, ctx| {
                Ok(PropertyValue::scalar(Resource::display(p, ctx)))
            })
            .read_only("gender", |p, _| Ok(PropertyValue::optional(p.gender.clone())))
            .read_only("birthdate", |p, _| {
                Ok(PropertyValue::optional(
                    p.birthdate.map(|d| d.format("%Y-%m-%d").to_string()),
                ))
            })
            .read_only("voided", |p, _| Ok(PropertyValue::scalar(p.voided)))
            .read_only("names", |p, _| {
                Ok(PropertyValue::Scalar(Value::Array(
                    p.names
                        .iter()
                        .map(|n| {
                            json!({
                                "display": n.full_name(),
                                "givenName": n.given_name,
                                "middleName": n.middle_name,
                                "familyName": n.family_name,
                                "preferred": n.preferred,
                            })
                        })
                        .collect(),
                )))
            })
            .read_only("auditInfo", |p, _| Ok(PropertyValue::Scalar(p.audit.to_value())))
    }
}
