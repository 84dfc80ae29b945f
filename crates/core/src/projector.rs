//! Representation projector.
//!
//! Turns an entity into an ordered JSON object for a representation level by walking the
//! resource's description, resolving each property through the registry and recursing
//! into nested entities at the level each property declares.
//!
//! Entity graphs may be cyclic (an observation group reachable from one of its own
//! members). The walk keeps the (resource, uuid, level) triples on the current path and
//! fails with [`ReprError::CycleDetected`] when one repeats; revisiting the same entity at
//! a different level is legitimate and allowed. The configured maximum depth bounds the
//! walk regardless.
//!
//! A nested entity requested at Ref without a Ref description renders as a stub (uuid,
//! display and self link). The same request at the top level is unsupported.

use crate::accessor::PropertyValue;
use crate::constants::LINKS_KEY;
use crate::context::RequestContext;
use crate::representation::Representation;
use crate::resource::Representable;
use crate::{ReprError, ReprResult};
use serde_json::{json, Map, Value};

/// Ordered key/value projection of an entity.
pub type SimpleObject = Map<String, Value>;

/// Projects `entity` at `representation`.
pub fn project(
    entity: &dyn Representable,
    representation: Representation,
    ctx: &RequestContext<'_>,
) -> ReprResult<SimpleObject> {
    Walk::new(ctx.config().max_projection_depth()).project(entity, representation, ctx)
}

/// Projects every entity at `representation`, failing on the first error.
pub fn project_all<'e, I, T>(
    entities: I,
    representation: Representation,
    ctx: &RequestContext<'_>,
) -> ReprResult<Vec<Value>>
where
    I: IntoIterator<Item = &'e T>,
    T: Representable + 'e,
{
    entities
        .into_iter()
        .map(|e| project(e, representation, ctx).map(Value::Object))
        .collect()
}

type PathKey = (&'static str, String, Representation);

struct Walk {
    path: Vec<PathKey>,
    max_depth: usize,
}

impl Walk {
    fn new(max_depth: usize) -> Self {
        Self {
            path: Vec::new(),
            max_depth,
        }
    }

    fn project(
        &mut self,
        entity: &dyn Representable,
        representation: Representation,
        ctx: &RequestContext<'_>,
    ) -> ReprResult<SimpleObject> {
        let key = (
            entity.resource_name(),
            entity.entity_uuid().to_string(),
            representation,
        );
        if self.path.contains(&key) {
            return Err(ReprError::CycleDetected {
                resource: key.0,
                uuid: key.1,
                representation,
            });
        }
        if self.path.len() >= self.max_depth {
            return Err(ReprError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }

        let nested = !self.path.is_empty();
        self.path.push(key);
        let result = self.project_entity(entity, representation, nested, ctx);
        self.path.pop();
        result
    }

    fn project_entity(
        &mut self,
        entity: &dyn Representable,
        representation: Representation,
        nested: bool,
        ctx: &RequestContext<'_>,
    ) -> ReprResult<SimpleObject> {
        let resource = entity.resource_name();
        let handler = ctx.registry().handler(resource)?;
        let self_uri = ctx.self_uri(resource, entity.entity_uuid());

        let description = match handler.description(representation) {
            Some(description) => description,
            None if nested && representation == Representation::Ref => {
                let mut stub = SimpleObject::new();
                stub.insert("uuid".into(), Value::from(entity.entity_uuid()));
                stub.insert("display".into(), Value::from(handler.display(entity, ctx)?));
                stub.insert(LINKS_KEY.into(), json!([link("self", &self_uri)]));
                return Ok(stub);
            }
            None => {
                return Err(ReprError::UnsupportedRepresentation {
                    resource,
                    representation,
                })
            }
        };

        tracing::trace!(resource, %representation, depth = self.path.len(), "projecting");

        let mut out = SimpleObject::new();
        for descriptor in description.properties() {
            let value = handler.get(entity, descriptor.name(), ctx)?;
            let level = descriptor.representation().unwrap_or(Representation::Default);
            if let Some(rendered) = self.render(value, level, ctx)? {
                out.insert(descriptor.name().to_string(), rendered);
            }
        }

        if !description.links().is_empty() {
            let links = description
                .links()
                .iter()
                .map(|l| link(l.rel(), &l.resolve(&self_uri)))
                .collect();
            out.insert(LINKS_KEY.into(), Value::Array(links));
        }

        Ok(out)
    }

    fn render(
        &mut self,
        value: PropertyValue,
        nested: Representation,
        ctx: &RequestContext<'_>,
    ) -> ReprResult<Option<Value>> {
        Ok(match value {
            PropertyValue::Absent => None,
            PropertyValue::Scalar(v) => Some(v),
            PropertyValue::Entity(e) => Some(Value::Object(self.project(e.as_ref(), nested, ctx)?)),
            PropertyValue::Entities(list) => {
                let mut items = Vec::with_capacity(list.len());
                for e in &list {
                    items.push(Value::Object(self.project(e.as_ref(), nested, ctx)?));
                }
                Some(Value::Array(items))
            }
        })
    }
}

fn link(rel: &str, uri: &str) -> Value {
    json!({ "rel": rel, "uri": uri })
}
