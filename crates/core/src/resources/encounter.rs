use crate::accessor::{FieldTable, PropertyValue};
use crate::context::RequestContext;
use crate::conversion::format_datetime;
use crate::description::ResourceDescription;
use crate::model::Encounter;
use crate::representation::Representation;
use crate::resource::Resource;

impl Resource for Encounter {
    const NAME: &'static str = "encounter";

    fn uuid(&self) -> &str {
        &self.uuid
    }

    /// `"<type> <dd/mm/yyyy>"`
    fn display(&self, _ctx: &RequestContext<'_>) -> String {
        format!(
            "{} {}",
            self.encounter_type,
            self.encounter_datetime.format("%d/%m/%Y")
        )
    }

    fn description(representation: Representation) -> Option<ResourceDescription> {
        let base = ResourceDescription::new()
            .property("uuid")
            .property("display")
            .property("encounterType")
            .property("encounterDatetime")
            .nested("patient", Representation::Ref);
        match representation {
            Representation::Default => Some(
                base.nested("location", Representation::Ref)
                    .property("voided")
                    .self_link()
                    .link("full", ".?v=full"),
            ),
            Representation::Full => Some(base.property("location").property("voided").self_link()),
            Representation::Ref => None,
        }
    }

    fn fields() -> FieldTable<Self> {
        FieldTable::<Encounter>::new()
            .read_only("uuid", |e, _| Ok(PropertyValue::scalar(e.uuid.as_str())))
            .read_only("display", |e, ctx| {
                Ok(PropertyValue::scalar(Resource::display(e, ctx)))
            })
            .read_only("encounterType", |e, _| {
                Ok(PropertyValue::scalar(e.encounter_type.as_str()))
            })
            .read_only("encounterDatetime", |e, _| {
                Ok(PropertyValue::scalar(format_datetime(&e.encounter_datetime)))
            })
            .read_only("patient", |e, _| Ok(PropertyValue::entity(e.patient.as_ref())))
            .read_only("location", |e, _| Ok(PropertyValue::entity(e.location.as_ref())))
            .read_only("voided", |e, _| Ok(PropertyValue::scalar(e.voided)))
    }
}
