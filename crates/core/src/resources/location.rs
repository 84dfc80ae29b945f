use crate::accessor::{FieldTable, PropertyValue};
use crate::context::RequestContext;
use crate::description::ResourceDescription;
use crate::model::Location;
use crate::representation::Representation;
use crate::resource::Resource;

impl Resource for Location {
    const NAME: &'static str = "location";

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn display(&self, _ctx: &RequestContext<'_>) -> String {
        self.name.clone()
    }

    fn description(representation: Representation) -> Option<ResourceDescription> {
        match representation {
            Representation::Default | Representation::Full => Some(
                ResourceDescription::new()
                    .property("uuid")
                    .property("display")
                    .property("name")
                    .property("description")
                    .property("retired")
                    .self_link(),
            ),
            Representation::Ref => None,
        }
    }

    fn fields() -> FieldTable<Self> {
        FieldTable::<Location>::new()
            .read_only("uuid", |l, _| Ok(PropertyValue::scalar(l.uuid.as_str())))
            .read_only("display", |l, ctx| {
                Ok(PropertyValue::scalar(Resource::display(l, ctx)))
            })
            .read_only("name", |l, _| Ok(PropertyValue::scalar(l.name.as_str())))
            .read_only("description", |l, _| {
                Ok(PropertyValue::optional(l.description.clone()))
            })
            .read_only("retired", |l, _| Ok(PropertyValue::scalar(l.retired)))
    }
}
