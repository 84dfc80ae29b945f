//! Request-scoped context.
//!
//! Everything a getter, setter or the projector needs beyond the entity itself is carried
//! here and passed explicitly: configuration, the resource registry, the service
//! delegates, the caller's locale, the requested representation and paging.

use crate::config::CoreConfig;
use crate::paging::PagingContext;
use crate::representation::Representation;
use crate::resource::ResourceRegistry;
use crate::services::Services;
use obsrest_types::Locale;

pub struct RequestContext<'a> {
    config: &'a CoreConfig,
    registry: &'a ResourceRegistry,
    services: &'a Services,
    locale: Locale,
    representation: Representation,
    paging: PagingContext,
    include_total_count: bool,
    uri: Option<String>,
}

impl<'a> RequestContext<'a> {
    /// Context with the configured default locale, the default representation and the
    /// configured default page size.
    pub fn new(
        config: &'a CoreConfig,
        registry: &'a ResourceRegistry,
        services: &'a Services,
    ) -> Self {
        Self {
            config,
            registry,
            services,
            locale: config.default_locale().clone(),
            representation: Representation::Default,
            paging: PagingContext::from_config(config),
            include_total_count: false,
            uri: None,
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    pub fn with_paging(mut self, paging: PagingContext) -> Self {
        self.paging = paging;
        self
    }

    pub fn with_total_count(mut self, include: bool) -> Self {
        self.include_total_count = include;
        self
    }

    /// URI of the current request without paging parameters; used for next/prev links.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn config(&self) -> &'a CoreConfig {
        self.config
    }

    pub fn registry(&self) -> &'a ResourceRegistry {
        self.registry
    }

    pub fn services(&self) -> &'a Services {
        self.services
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn representation(&self) -> Representation {
        self.representation
    }

    pub fn paging(&self) -> PagingContext {
        self.paging
    }

    pub fn include_total_count(&self) -> bool {
        self.include_total_count
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// `{base_uri}/{resource}/{uuid}`
    pub fn self_uri(&self, resource: &str, uuid: &str) -> String {
        format!("{}/{}/{}", self.config.base_uri(), resource, uuid)
    }
}
