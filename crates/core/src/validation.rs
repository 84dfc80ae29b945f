//! Input validation utilities.
//!
//! This module contains functions for validating configuration values before they are
//! embedded into link URIs.

use crate::{ReprError, ReprResult};

/// Validates that a base URI is safe to prefix onto every rendered link.
///
/// Every projection embeds `{base_uri}/{resource}/{uuid}` as its self link, so the base
/// must be an absolute http(s) URI without whitespace, query or fragment.
///
/// # Errors
///
/// Returns `ReprError::InvalidConfig` if the base URI is invalid.
pub fn validate_base_uri(base_uri: &str) -> ReprResult<()> {
    const MAX_BASE_URI_LEN: usize = 2048;

    if base_uri.trim().is_empty() {
        return Err(ReprError::InvalidConfig("base URI cannot be empty".into()));
    }

    if base_uri.len() > MAX_BASE_URI_LEN {
        return Err(ReprError::InvalidConfig(format!(
            "base URI exceeds maximum length of {} characters",
            MAX_BASE_URI_LEN
        )));
    }

    if !base_uri.is_ascii() {
        return Err(ReprError::InvalidConfig(
            "base URI must contain only ASCII characters".into(),
        ));
    }

    let rest = base_uri
        .strip_prefix("http://")
        .or_else(|| base_uri.strip_prefix("https://"))
        .ok_or_else(|| {
            ReprError::InvalidConfig("base URI must start with http:// or https://".into())
        })?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(ReprError::InvalidConfig("base URI must name a host".into()));
    }

    if base_uri
        .bytes()
        .any(|b| b.is_ascii_whitespace() || b.is_ascii_control() || b == b'?' || b == b'#')
    {
        return Err(ReprError::InvalidConfig(
            "base URI must not contain whitespace, a query or a fragment".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_http_and_https() {
        validate_base_uri("http://localhost:3000/ws/rest/v1").unwrap();
        validate_base_uri("https://emr.example.org/openmrs/ws/rest/v1").unwrap();
    }

    #[test]
    fn rejects_missing_scheme_or_host() {
        assert!(validate_base_uri("localhost:3000").is_err());
        assert!(validate_base_uri("http://").is_err());
        assert!(validate_base_uri("https:///path").is_err());
        assert!(validate_base_uri("   ").is_err());
    }

    #[test]
    fn rejects_query_fragment_and_whitespace() {
        assert!(validate_base_uri("http://host/api?x=1").is_err());
        assert!(validate_base_uri("http://host/api#top").is_err());
        assert!(validate_base_uri("http://host/a b").is_err());
    }
}
