use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::database::models::{DatosGeneralesInput, DatosGeneralesView, Planeacion, PlaneacionSummary};
use crate::handlers::parse_id;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::planeacion_service::{CreatePlaneacionRequest, UpdatePlaneacionRequest};
use crate::services::PlaneacionService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

const ACK: Ack = Ack { ok: true };

fn planeaciones(state: &AppState) -> PlaneacionService {
    PlaneacionService::new(state.store.clone())
}

/// GET /api/planeaciones - the caller's documents, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<PlaneacionSummary>> {
    let items = planeaciones(&state).list(auth.user_id).await?;
    Ok(ApiResponse::success(items))
}

/// POST /api/planeaciones
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<CreatePlaneacionRequest>, JsonRejection>,
) -> ApiResult<Created> {
    let Json(request) = payload?;
    let id = planeaciones(&state).create(auth.user_id, auth.unidad_id, request).await?;
    Ok(ApiResponse::created(Created { id }))
}

/// GET /api/planeaciones/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Planeacion> {
    let id = parse_id(&id)?;
    let planeacion = planeaciones(&state).get(id, auth.user_id).await?;
    Ok(ApiResponse::success(planeacion))
}

/// PUT /api/planeaciones/:id - partial update of title, status, completed sections
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePlaneacionRequest>, JsonRejection>,
) -> ApiResult<Ack> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    planeaciones(&state).update(id, auth.user_id, request).await?;
    Ok(ApiResponse::success(ACK))
}

/// DELETE /api/planeaciones/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Ack> {
    let id = parse_id(&id)?;
    planeaciones(&state).delete(id, auth.user_id).await?;
    Ok(ApiResponse::success(ACK))
}

/// GET /api/planeaciones/:id/datos-generales
pub async fn get_datos_generales(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<DatosGeneralesView> {
    let id = parse_id(&id)?;
    let view = planeaciones(&state).datos_generales(id, auth.user_id).await?;
    Ok(ApiResponse::success(view))
}

/// PUT /api/planeaciones/:id/datos-generales
pub async fn put_datos_generales(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<DatosGeneralesInput>, JsonRejection>,
) -> ApiResult<Ack> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    planeaciones(&state).save_datos_generales(id, auth.user_id, input).await?;
    Ok(ApiResponse::success(ACK))
}
