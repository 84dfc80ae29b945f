//! Handlers for `/ws/rest/v1/obs`.

use crate::{ApiError, AppState, ErrorRes};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use obsrest_core::constants::DEFAULT_VOID_REASON;
use obsrest_core::model::Obs;
use obsrest_core::{
    obs_by_encounter, obs_by_patient, pipeline, project, PagingContext, ReprError,
    Representation, RequestContext,
};
use obsrest_types::NonEmptyText;
use obsrest_uuid::EntityUuid;
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::IntoParams;

/// Query parameters of the observation listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Free-text search over concept name, person name and comment.
    q: Option<String>,
    /// Patient uuid; lists that patient's observations.
    patient: Option<String>,
    /// Encounter uuid; lists the encounter's observations.
    encounter: Option<String>,
    /// Representation: `ref`, `default` or `full`.
    v: Option<String>,
    start_index: Option<usize>,
    limit: Option<usize>,
    total_count: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RepresentationParams {
    /// Representation: `ref`, `default` or `full`.
    v: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteParams {
    /// Why the observation is voided.
    reason: Option<String>,
    /// Remove permanently instead of voiding.
    purge: Option<bool>,
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(p)| p)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn representation(v: Option<&str>) -> Result<Representation, ApiError> {
    Ok(v.map(Representation::parse)
        .transpose()?
        .unwrap_or(Representation::Default))
}

fn canonical_uuid(raw: &str) -> Result<String, ApiError> {
    Ok(EntityUuid::parse(raw).map_err(ReprError::from)?.to_string())
}

fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(ApiError::bad_request("request body must be a JSON object")),
        Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
    }
}

/// The listing URI with paging parameters stripped, used as the base for paging links.
fn listing_uri(ctx: &RequestContext<'_>, raw_query: Option<&str>) -> String {
    let kept: Vec<&str> = raw_query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            key != "startIndex" && key != "limit"
        })
        .collect();
    let base = format!("{}/obs", ctx.config().base_uri());
    if kept.is_empty() {
        base
    } else {
        format!("{base}?{}", kept.join("&"))
    }
}

#[utoipa::path(
    get,
    path = "/ws/rest/v1/obs",
    params(ListParams),
    responses(
        (status = 200, description = "One page of observations", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Patient or encounter not found", body = ErrorRes)
    )
)]
/// Lists observations for a patient, an encounter or a free-text query.
///
/// Exactly one selector is used, in the order `patient`, `encounter`, `q`. A request with
/// none of them is rejected rather than listing everything.
#[axum::debug_handler]
pub async fn list_obs(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let params = query(params)?;
    let paging = PagingContext::from_request(params.start_index, params.limit, &state.config)?;
    let ctx = state
        .context(&headers)
        .with_representation(representation(params.v.as_deref())?)
        .with_paging(paging)
        .with_total_count(params.total_count.unwrap_or(false));
    let uri = listing_uri(&ctx, raw_query.as_deref());
    let ctx = ctx.with_uri(uri);

    let page = if let Some(patient) = params.patient.as_deref() {
        obs_by_patient(&canonical_uuid(patient)?, &ctx)?
    } else if let Some(encounter) = params.encounter.as_deref() {
        obs_by_encounter(&canonical_uuid(encounter)?, &ctx)?
    } else if let Some(q) = params.q.as_deref() {
        pipeline::search::<Obs>(q, &ctx)?
    } else {
        return Err(ApiError::bad_request(
            "one of q, patient or encounter is required",
        ));
    };

    tracing::debug!(
        total = page.total_count(),
        start = page.start_index(),
        "listed obs"
    );
    Ok(Json(Value::Object(page.to_simple_object(&ctx)?)))
}

#[utoipa::path(
    get,
    path = "/ws/rest/v1/obs/{uuid}",
    params(
        ("uuid" = String, Path, description = "Observation uuid"),
        RepresentationParams
    ),
    responses(
        (status = 200, description = "The observation", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_obs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uuid): Path<String>,
    params: Result<Query<RepresentationParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let params = query(params)?;
    let ctx = state.context(&headers);
    let representation = representation(params.v.as_deref())?;

    let obs = pipeline::retrieve::<Obs>(&canonical_uuid(&uuid)?, &ctx)?;
    Ok(Json(Value::Object(project(&obs, representation, &ctx)?)))
}

#[utoipa::path(
    post,
    path = "/ws/rest/v1/obs",
    params(RepresentationParams),
    request_body(content = Object, description = "Observation properties"),
    responses(
        (status = 201, description = "Observation created", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
/// Creates an observation and returns the stored result.
#[axum::debug_handler]
pub async fn create_obs(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<RepresentationParams>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let params = query(params)?;
    let input = object_body(body)?;
    let ctx = state.context(&headers);
    let representation = representation(params.v.as_deref())?;

    let created = pipeline::create::<Obs>(&input, &ctx)?;
    tracing::info!(uuid = %created.uuid, "obs created");
    Ok((
        StatusCode::CREATED,
        Json(Value::Object(project(&created, representation, &ctx)?)),
    ))
}

#[utoipa::path(
    post,
    path = "/ws/rest/v1/obs/{uuid}",
    params(
        ("uuid" = String, Path, description = "Observation uuid"),
        RepresentationParams
    ),
    request_body(content = Object, description = "Properties to change"),
    responses(
        (status = 200, description = "Observation updated", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Not found", body = ErrorRes)
    )
)]
/// Applies the submitted properties to an existing observation.
#[axum::debug_handler]
pub async fn update_obs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uuid): Path<String>,
    params: Result<Query<RepresentationParams>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let params = query(params)?;
    let input = object_body(body)?;
    let ctx = state.context(&headers);
    let representation = representation(params.v.as_deref())?;

    let updated = pipeline::update::<Obs>(&canonical_uuid(&uuid)?, &input, &ctx)?;
    tracing::info!(uuid = %updated.uuid, "obs updated");
    Ok(Json(Value::Object(project(&updated, representation, &ctx)?)))
}

#[utoipa::path(
    delete,
    path = "/ws/rest/v1/obs/{uuid}",
    params(
        ("uuid" = String, Path, description = "Observation uuid"),
        DeleteParams
    ),
    responses(
        (status = 204, description = "Observation voided or purged"),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Not found", body = ErrorRes)
    )
)]
/// Voids an observation, or removes it when `purge=true`.
#[axum::debug_handler]
pub async fn delete_obs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uuid): Path<String>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let params = query(params)?;
    let ctx = state.context(&headers);
    let obs = pipeline::retrieve::<Obs>(&canonical_uuid(&uuid)?, &ctx)?;

    if params.purge.unwrap_or(false) {
        pipeline::purge(&obs, &ctx)?;
        tracing::info!(uuid = %obs.uuid, "obs purged");
    } else {
        let reason = NonEmptyText::new(params.reason.as_deref().unwrap_or(DEFAULT_VOID_REASON))
            .map_err(ReprError::from)?;
        pipeline::delete(&obs, &reason, &ctx)?;
        tracing::info!(uuid = %obs.uuid, %reason, "obs voided");
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}
