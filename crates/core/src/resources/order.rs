use crate::accessor::{FieldTable, PropertyValue};
use crate::context::RequestContext;
use crate::conversion::format_datetime;
use crate::description::ResourceDescription;
use crate::model::Order;
use crate::representation::Representation;
use crate::resource::Resource;

impl Resource for Order {
    const NAME: &'static str = "order";

    fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Name of the ordered concept, or the uuid when there is none.
    fn display(&self, ctx: &RequestContext<'_>) -> String {
        self.concept
            .as_ref()
            .and_then(|c| c.name(ctx.locale()))
            .unwrap_or(self.uuid.as_str())
            .to_string()
    }

    fn description(representation: Representation) -> Option<ResourceDescription> {
        let start = ResourceDescription::new().property("uuid").property("display");
        let start = match representation {
            Representation::Default => start.nested("concept", Representation::Ref),
            Representation::Full => start.property("concept"),
            Representation::Ref => return None,
        };
        Some(
            start
                .property("instructions")
                .property("startDate")
                .nested("patient", Representation::Ref)
                .property("voided")
                .self_link(),
        )
    }

    fn fields() -> FieldTable<Self> {
        FieldTable::<Order>::new()
            .read_only("uuid", |o, _| Ok(PropertyValue::scalar(o.uuid.as_str())))
            .read_only("display", |o, ctx| {
                Ok(PropertyValue::scalar(Resource::display(o, ctx)))
            })
            .read_only("concept", |o, _| Ok(PropertyValue::entity(o.concept.as_ref())))
            .read_only("instructions", |o, _| {
                Ok(PropertyValue::optional(o.instructions.clone()))
            })
            .read_only("startDate", |o, _| {
                Ok(PropertyValue::optional(o.start_date.as_ref().map(format_datetime)))
            })
            .read_only("patient", |o, _| Ok(PropertyValue::entity(o.patient.as_ref())))
            .read_only("voided", |o, _| Ok(PropertyValue::scalar(o.voided)))
    }
}
