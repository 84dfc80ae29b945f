use crate::accessor::{FieldTable, PropertyValue};
use crate::context::RequestContext;
use crate::description::ResourceDescription;
use crate::model::Concept;
use crate::representation::Representation;
use crate::resource::Resource;
use serde_json::{json, Value};

impl Resource for Concept {
    const NAME: &'static str = "concept";

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn display(&self, ctx: &RequestContext<'_>) -> String {
        self.name(ctx.locale()).unwrap_or_default().to_string()
    }

    fn description(representation: Representation) -> Option<ResourceDescription> {
        let base = ResourceDescription::new()
            .property("uuid")
            .property("display")
            .property("name")
            .property("datatype")
            .property("conceptClass")
            .property("units");
        match representation {
            Representation::Default => Some(
                base.property("retired")
                    .self_link()
                    .link("full", ".?v=full"),
            ),
            Representation::Full => Some(
                base.property("names")
                    .property("precise")
                    .property("hiNormal")
                    .property("lowNormal")
                    .property("answers")
                    .property("retired")
                    .self_link(),
            ),
            Representation::Ref => None,
        }
    }

    fn fields() -> FieldTable<Self> {
        FieldTable::<Concept>::new()
            .read_only("uuid", |c, _| Ok(PropertyValue::scalar(c.uuid.as_str())))
            .read_only("display", |c, ctx| {
                Ok(PropertyValue::scalar(Resource::display(c, ctx)))
            })
            .read_only("name", |c, ctx| {
                Ok(PropertyValue::optional(c.name(ctx.locale())))
            })
            .read_only("names", |c, _| {
                Ok(PropertyValue::Scalar(Value::Array(
                    c.names
                        .iter()
                        .map(|n| {
                            json!({
                                "name": n.name,
                                "locale": n.locale.to_string(),
                                "preferred": n.preferred,
                            })
                        })
                        .collect(),
                )))
            })
            .read_only("datatype", |c, _| Ok(PropertyValue::scalar(c.datatype.as_str())))
            .read_only("conceptClass", |c, _| {
                Ok(PropertyValue::scalar(c.concept_class.as_str()))
            })
            .read_only("units", |c, _| Ok(PropertyValue::optional(c.units())))
            .read_only("precise", |c, _| {
                Ok(PropertyValue::optional(c.numeric.as_ref().map(|n| n.precise)))
            })
            .read_only("hiNormal", |c, _| {
                Ok(PropertyValue::optional(c.numeric.as_ref().and_then(|n| n.hi_normal)))
            })
            .read_only("lowNormal", |c, _| {
                Ok(PropertyValue::optional(c.numeric.as_ref().and_then(|n| n.low_normal)))
            })
            .read_only("answers", |c, _| {
                if c.answers.is_empty() {
                    return Ok(PropertyValue::Absent);
                }
                Ok(PropertyValue::scalar(c.answers.clone()))
            })
            .read_only("retired", |c, _| Ok(PropertyValue::scalar(c.retired)))
    }
}
