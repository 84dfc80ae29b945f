//! Paging of search results.
//!
//! The search delegate returns the full match list; [`PagedResult::paginate`] slices it to
//! the caller's window and records whether more results exist beyond it.

use crate::config::CoreConfig;
use crate::context::RequestContext;
use crate::projector::{project_all, SimpleObject};
use crate::resource::Representable;
use crate::{ReprError, ReprResult};
use serde_json::{json, Value};

/// Caller-supplied window over a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingContext {
    start_index: usize,
    limit: usize,
}

impl PagingContext {
    pub fn new(start_index: usize, limit: usize) -> ReprResult<Self> {
        if limit == 0 {
            return Err(ReprError::InvalidInput("limit must be positive".into()));
        }
        Ok(Self { start_index, limit })
    }

    /// Starts at 0 with the configured default page size.
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            start_index: 0,
            limit: config.default_page_limit(),
        }
    }

    /// Builds a window from optional request parameters. A limit above the configured
    /// maximum is clamped to it.
    pub fn from_request(
        start_index: Option<usize>,
        limit: Option<usize>,
        config: &CoreConfig,
    ) -> ReprResult<Self> {
        let limit = limit
            .unwrap_or(config.default_page_limit())
            .min(config.max_page_limit());
        Self::new(start_index.unwrap_or(0), limit)
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// One page of results plus the metadata needed to navigate the rest.
#[derive(Debug, Clone)]
pub struct PagedResult<T> {
    results: Vec<T>,
    start_index: usize,
    limit: usize,
    total_count: usize,
}

impl<T> PagedResult<T> {
    /// Slices `all` to the window described by `paging`.
    pub fn paginate(all: Vec<T>, paging: PagingContext) -> Self {
        let total_count = all.len();
        let results = all
            .into_iter()
            .skip(paging.start_index())
            .take(paging.limit())
            .collect();
        Self {
            results,
            start_index: paging.start_index(),
            limit: paging.limit(),
            total_count,
        }
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn into_results(self) -> Vec<T> {
        self.results
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn has_more(&self) -> bool {
        self.start_index.saturating_add(self.limit) < self.total_count
    }

    pub fn has_previous(&self) -> bool {
        self.start_index > 0
    }
}

impl<T: Representable> PagedResult<T> {
    /// Renders `{"results": [...], "totalCount": n, "links": [next, prev]}`.
    ///
    /// Results are projected at the context's representation. `totalCount` is included
    /// only when the caller asked for it; links only when the context knows the request
    /// URI.
    pub fn to_simple_object(&self, ctx: &RequestContext<'_>) -> ReprResult<SimpleObject> {
        let mut out = SimpleObject::new();
        out.insert(
            "results".into(),
            Value::Array(project_all(&self.results, ctx.representation(), ctx)?),
        );

        if ctx.include_total_count() {
            out.insert("totalCount".into(), Value::from(self.total_count));
        }

        if let Some(uri) = ctx.uri() {
            let mut links = Vec::new();
            if self.has_more() {
                let next = self.start_index.saturating_add(self.limit);
                links.push(json!({ "rel": "next", "uri": page_uri(uri, next, self.limit) }));
            }
            if self.has_previous() {
                let prev = self.start_index.saturating_sub(self.limit);
                links.push(json!({ "rel": "prev", "uri": page_uri(uri, prev, self.limit) }));
            }
            if !links.is_empty() {
                out.insert(crate::constants::LINKS_KEY.into(), Value::Array(links));
            }
        }

        Ok(out)
    }
}

fn page_uri(uri: &str, start_index: usize, limit: usize) -> String {
    let sep = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{sep}startIndex={start_index}&limit={limit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(all: usize, start: usize, limit: usize) -> PagedResult<usize> {
        PagedResult::paginate((0..all).collect(), PagingContext::new(start, limit).unwrap())
    }

    #[test]
    fn first_page_reports_more() {
        let p = page(5, 0, 2);
        assert_eq!(p.results(), &[0, 1]);
        assert_eq!(p.total_count(), 5);
        assert!(p.has_more());
        assert!(!p.has_previous());
    }

    #[test]
    fn last_page_is_partial() {
        let p = page(5, 4, 2);
        assert_eq!(p.results(), &[4]);
        assert!(!p.has_more());
        assert!(p.has_previous());
    }

    #[test]
    fn exact_fit_has_no_more() {
        let p = page(4, 2, 2);
        assert_eq!(p.results(), &[2, 3]);
        assert!(!p.has_more());
    }

    #[test]
    fn start_beyond_end_is_empty() {
        let p = page(3, 10, 5);
        assert!(p.results().is_empty());
        assert!(!p.has_more());
        assert_eq!(p.total_count(), 3);
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(matches!(
            PagingContext::new(0, 0),
            Err(ReprError::InvalidInput(_))
        ));
    }

    #[test]
    fn from_request_clamps_and_defaults() {
        let cfg = CoreConfig::default();
        let p = PagingContext::from_request(None, Some(10_000), &cfg).unwrap();
        assert_eq!(p.limit(), cfg.max_page_limit());
        let p = PagingContext::from_request(Some(3), None, &cfg).unwrap();
        assert_eq!(p.start_index(), 3);
        assert_eq!(p.limit(), cfg.default_page_limit());
    }

    #[test]
    fn page_uri_appends_parameters() {
        assert_eq!(page_uri("http://h/obs", 2, 2), "http://h/obs?startIndex=2&limit=2");
        assert_eq!(
            page_uri("http://h/obs?q=hb", 0, 5),
            "http://h/obs?q=hb&startIndex=0&limit=5"
        );
    }
}
