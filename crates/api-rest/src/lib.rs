//! # API REST
//!
//! REST API for the observation resource.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (query parameters, locale negotiation, status codes, CORS)
//!
//! Representation, update and paging semantics all live in `obsrest-core`; handlers here
//! only translate requests into a [`RequestContext`] and engine errors into responses.

#![warn(rust_2018_idioms)]

mod error;
mod obs;

pub use error::{ApiError, ErrorBody, ErrorRes};

use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap};
use axum::{extract::State, response::Json, routing::get, Router};
use obsrest_core::{CoreConfig, RequestContext, ResourceRegistry, Services};
use obsrest_types::Locale;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Path prefix of the REST resources.
pub const REST_PREFIX: &str = "/ws/rest/v1";

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CoreConfig>,
    pub registry: Arc<ResourceRegistry>,
    pub services: Services,
}

impl AppState {
    pub fn new(config: CoreConfig, registry: ResourceRegistry, services: Services) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            services,
        }
    }

    /// Request context with the locale negotiated from `Accept-Language`, falling back to
    /// the configured default.
    fn context(&self, headers: &HeaderMap) -> RequestContext<'_> {
        let ctx = RequestContext::new(&self.config, &self.registry, &self.services);
        match headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(Locale::from_accept_language)
        {
            Some(locale) => ctx.with_locale(locale),
            None => ctx,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        obs::list_obs,
        obs::get_obs,
        obs::create_obs,
        obs::update_obs,
        obs::delete_obs,
    ),
    components(schemas(HealthRes, ErrorRes, ErrorBody))
)]
struct ApiDoc;

/// Builds the application router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    let obs_collection = format!("{REST_PREFIX}/obs");
    let obs_member = format!("{REST_PREFIX}/obs/:uuid");

    Router::new()
        .route("/health", get(health))
        .route(
            &obs_collection,
            get(obs::list_obs).post(obs::create_obs),
        )
        .route(
            &obs_member,
            get(obs::get_obs)
                .post(obs::update_obs)
                .delete(obs::delete_obs),
        )
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Observation REST API is alive".into(),
    })
}
