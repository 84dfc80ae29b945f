//! Resource descriptions: the per-level, ordered list of exposed properties and links.
//!
//! A description names properties only. Whether a name resolves to a generic accessor or
//! to an override is decided when the projector asks for it, so descriptions can be built
//! before any accessor exists.

use crate::constants::{LINKS_KEY, SELF_REL};
use crate::representation::Representation;
use crate::{ReprError, ReprResult};
use std::collections::HashSet;

/// One exposed property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: &'static str,
    representation: Option<Representation>,
}

impl PropertyDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Level at which a nested entity is rendered. `None` means the nested resource's
    /// default representation.
    pub fn representation(&self) -> Option<Representation> {
        self.representation
    }
}

/// Target of a declared link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// The entity's own URI.
    SelfUri,
    /// A URI relative to the entity's own URI when it starts with `.`, absolute otherwise.
    Uri(&'static str),
}

/// A link rendered under the reserved `links` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDescriptor {
    rel: &'static str,
    target: LinkTarget,
}

impl LinkDescriptor {
    pub fn rel(&self) -> &'static str {
        self.rel
    }

    pub fn target(&self) -> &LinkTarget {
        &self.target
    }

    /// Resolves the link against the entity's self URI.
    pub fn resolve(&self, self_uri: &str) -> String {
        match &self.target {
            LinkTarget::SelfUri => self_uri.to_string(),
            LinkTarget::Uri(uri) => match uri.strip_prefix('.') {
                Some(rest) => format!("{self_uri}{rest}"),
                None => (*uri).to_string(),
            },
        }
    }
}

/// Ordered description of one representation level of a resource.
///
/// Insertion order is the render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDescription {
    properties: Vec<PropertyDescriptor>,
    links: Vec<LinkDescriptor>,
}

impl ResourceDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property; nested entities render at their default level.
    pub fn property(mut self, name: &'static str) -> Self {
        self.properties.push(PropertyDescriptor {
            name,
            representation: None,
        });
        self
    }

    /// Adds a property whose nested entities render at `representation`.
    pub fn nested(mut self, name: &'static str, representation: Representation) -> Self {
        self.properties.push(PropertyDescriptor {
            name,
            representation: Some(representation),
        });
        self
    }

    pub fn self_link(mut self) -> Self {
        self.links.push(LinkDescriptor {
            rel: SELF_REL,
            target: LinkTarget::SelfUri,
        });
        self
    }

    pub fn link(mut self, rel: &'static str, uri: &'static str) -> Self {
        self.links.push(LinkDescriptor {
            rel,
            target: LinkTarget::Uri(uri),
        });
        self
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn links(&self) -> &[LinkDescriptor] {
        &self.links
    }

    pub fn property_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.iter().map(|p| p.name)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Rejects descriptions that would render two values under one key.
    pub(crate) fn validate(&self, resource: &'static str) -> ReprResult<()> {
        let mut seen = HashSet::new();
        for property in &self.properties {
            if property.name == LINKS_KEY || !seen.insert(property.name) {
                return Err(ReprError::InvalidDescription {
                    resource,
                    property: property.name.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let d = ResourceDescription::new()
            .property("uuid")
            .nested("concept", Representation::Ref)
            .property("value");
        let names: Vec<_> = d.property_names().collect();
        assert_eq!(names, vec!["uuid", "concept", "value"]);
        assert_eq!(
            d.get("concept").unwrap().representation(),
            Some(Representation::Ref)
        );
        assert_eq!(d.get("value").unwrap().representation(), None);
    }

    #[test]
    fn relative_links_resolve_against_self() {
        let d = ResourceDescription::new()
            .self_link()
            .link("full", ".?v=full")
            .link("docs", "http://docs.example.org/obs");
        let self_uri = "http://h/ws/rest/v1/obs/abc";
        let resolved: Vec<_> = d.links().iter().map(|l| l.resolve(self_uri)).collect();
        assert_eq!(
            resolved,
            vec![
                "http://h/ws/rest/v1/obs/abc".to_string(),
                "http://h/ws/rest/v1/obs/abc?v=full".to_string(),
                "http://docs.example.org/obs".to_string(),
            ]
        );
    }

    #[test]
    fn validate_rejects_reserved_links_key() {
        let d = ResourceDescription::new().property("uuid").property("links");
        assert!(matches!(
            d.validate("obs"),
            Err(ReprError::InvalidDescription { .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicates() {
        let d = ResourceDescription::new()
            .property("uuid")
            .nested("uuid", Representation::Ref);
        assert!(d.validate("obs").is_err());
    }
}
