//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the engine via
//! the request context. The engine never reads process-wide environment variables while
//! handling a request; the `*_from_env_value` helpers take the raw value so binaries and
//! tests decide where it comes from.

use crate::constants::{
    DEFAULT_BASE_URI, DEFAULT_MAX_PROJECTION_DEPTH, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
use crate::validation::validate_base_uri;
use crate::{ReprError, ReprResult};
use obsrest_types::Locale;

pub const BASE_URI_VAR: &str = "OBSREST_BASE_URI";
pub const MAX_DEPTH_VAR: &str = "OBSREST_MAX_DEPTH";
pub const DEFAULT_LIMIT_VAR: &str = "OBSREST_DEFAULT_LIMIT";
pub const MAX_LIMIT_VAR: &str = "OBSREST_MAX_LIMIT";
pub const LOCALE_VAR: &str = "OBSREST_LOCALE";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    base_uri: String,
    max_projection_depth: usize,
    default_page_limit: usize,
    max_page_limit: usize,
    default_locale: Locale,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// A trailing `/` on `base_uri` is dropped so links can be joined with `/`.
    pub fn new(
        base_uri: String,
        max_projection_depth: usize,
        default_page_limit: usize,
        max_page_limit: usize,
        default_locale: Locale,
    ) -> ReprResult<Self> {
        let base_uri = base_uri.trim().trim_end_matches('/').to_string();
        validate_base_uri(&base_uri)?;

        if max_projection_depth == 0 {
            return Err(ReprError::InvalidConfig(
                "max projection depth must be at least 1".into(),
            ));
        }

        if default_page_limit == 0 || max_page_limit == 0 {
            return Err(ReprError::InvalidConfig(
                "page limits must be positive".into(),
            ));
        }

        if default_page_limit > max_page_limit {
            return Err(ReprError::InvalidConfig(format!(
                "default page limit {} exceeds max page limit {}",
                default_page_limit, max_page_limit
            )));
        }

        Ok(Self {
            base_uri,
            max_projection_depth,
            default_page_limit,
            max_page_limit,
            default_locale,
        })
    }

    /// Resolves every setting through `lookup`, which is given the variable name.
    ///
    /// Binaries pass `|name| std::env::var(name).ok()`; tests pass a map lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ReprResult<Self> {
        Self::new(
            base_uri_from_env_value(lookup(BASE_URI_VAR)),
            usize_from_env_value(
                MAX_DEPTH_VAR,
                lookup(MAX_DEPTH_VAR),
                DEFAULT_MAX_PROJECTION_DEPTH,
            )?,
            usize_from_env_value(
                DEFAULT_LIMIT_VAR,
                lookup(DEFAULT_LIMIT_VAR),
                DEFAULT_PAGE_LIMIT,
            )?,
            usize_from_env_value(MAX_LIMIT_VAR, lookup(MAX_LIMIT_VAR), MAX_PAGE_LIMIT)?,
            locale_from_env_value(lookup(LOCALE_VAR))?,
        )
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn max_projection_depth(&self) -> usize {
        self.max_projection_depth
    }

    pub fn default_page_limit(&self) -> usize {
        self.default_page_limit
    }

    pub fn max_page_limit(&self) -> usize {
        self.max_page_limit
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.into(),
            max_projection_depth: DEFAULT_MAX_PROJECTION_DEPTH,
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: MAX_PAGE_LIMIT,
            default_locale: Locale::default(),
        }
    }
}

/// Parse a positive integer setting from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
pub fn usize_from_env_value(
    name: &str,
    value: Option<String>,
    default: usize,
) -> ReprResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default),
        Some(v) => v.parse::<usize>().map_err(|_| {
            ReprError::InvalidConfig(format!("{name} must be a non-negative integer, got '{v}'"))
        }),
    }
}

/// Parse the default locale from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `en`.
pub fn locale_from_env_value(value: Option<String>) -> ReprResult<Locale> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(Locale::default()),
        Some(v) => {
            Locale::parse(&v).map_err(|e| ReprError::InvalidConfig(format!("{e}")))
        }
    }
}

/// Resolve the link base URI from an optional string value.
pub fn base_uri_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URI.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_trailing_slash() {
        let cfg = CoreConfig::new(
            "http://emr.local/ws/rest/v1/".into(),
            8,
            10,
            20,
            Locale::default(),
        )
        .unwrap();
        assert_eq!(cfg.base_uri(), "http://emr.local/ws/rest/v1");
    }

    #[test]
    fn new_rejects_inverted_page_limits() {
        let err = CoreConfig::new(DEFAULT_BASE_URI.into(), 8, 50, 10, Locale::default())
            .expect_err("default above max should fail");
        assert!(matches!(err, ReprError::InvalidConfig(_)));
    }

    #[test]
    fn new_rejects_zero_depth() {
        assert!(CoreConfig::new(DEFAULT_BASE_URI.into(), 0, 5, 10, Locale::default()).is_err());
    }

    #[test]
    fn usize_from_env_value_defaults_when_blank() {
        assert_eq!(usize_from_env_value("X", None, 7).unwrap(), 7);
        assert_eq!(usize_from_env_value("X", Some("  ".into()), 7).unwrap(), 7);
        assert_eq!(usize_from_env_value("X", Some(" 12 ".into()), 7).unwrap(), 12);
        assert!(usize_from_env_value("X", Some("-1".into()), 7).is_err());
    }

    #[test]
    fn locale_from_env_value_parses_or_defaults() {
        assert_eq!(locale_from_env_value(None).unwrap(), Locale::default());
        assert_eq!(
            locale_from_env_value(Some("fr_CA".into())).unwrap().to_string(),
            "fr_CA"
        );
        assert!(locale_from_env_value(Some("nope!".into())).is_err());
    }

    #[test]
    fn base_uri_from_env_value_falls_back() {
        assert_eq!(base_uri_from_env_value(None), DEFAULT_BASE_URI);
        assert_eq!(
            base_uri_from_env_value(Some("https://x.org/api".into())),
            "https://x.org/api"
        );
    }

    #[test]
    fn from_lookup_reads_named_settings() {
        let lookup = |name: &str| match name {
            MAX_DEPTH_VAR => Some("4".to_string()),
            LOCALE_VAR => Some("en_GB".to_string()),
            _ => None,
        };
        let cfg = CoreConfig::from_lookup(lookup).unwrap();
        assert_eq!(cfg.max_projection_depth(), 4);
        assert_eq!(cfg.default_locale().to_string(), "en_GB");
        assert_eq!(cfg.base_uri(), DEFAULT_BASE_URI);
        assert_eq!(cfg.default_page_limit(), DEFAULT_PAGE_LIMIT);

        let bad = |name: &str| (name == DEFAULT_LIMIT_VAR).then(|| "500".to_string());
        assert!(matches!(
            CoreConfig::from_lookup(bad),
            Err(ReprError::InvalidConfig(_))
        ));
    }
}
