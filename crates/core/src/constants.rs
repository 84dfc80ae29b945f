//! Constants used throughout the observation service core crate.

/// Reserved projection key under which links are rendered. No resource may declare a
/// property with this name.
pub const LINKS_KEY: &str = "links";

/// Link relation for an entity's own URI.
pub const SELF_REL: &str = "self";

/// Reason recorded with every save made through the REST pipeline.
pub const SAVE_REASON: &str = "REST web service";

/// Default base URI used to build link targets.
pub const DEFAULT_BASE_URI: &str = "http://localhost:3000/ws/rest/v1";

/// Default maximum nesting depth for a single projection.
pub const DEFAULT_MAX_PROJECTION_DEPTH: usize = 16;

/// Default number of results per page when the caller does not supply a limit.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Wire format for date-times in projections and inputs (`2011-12-01T00:00:00.000+0000`).
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Void reason used when a delete request does not supply one.
pub const DEFAULT_VOID_REASON: &str = "Voided via REST web service";
