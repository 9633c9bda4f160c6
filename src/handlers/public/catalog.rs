use axum::extract::{rejection::QueryRejection, Path, Query, State};

use crate::database::models::{PublicPlaneacion, PublicStats};
use crate::handlers::parse_id;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{CatalogService, SearchPage, SearchParams};
use crate::state::AppState;

fn catalog(state: &AppState) -> CatalogService {
    CatalogService::new(state.store.clone(), state.config.catalog.clone())
}

/// GET /api/public/planeaciones?profesor=&unidad=&ua=&limit=&offset=
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<SearchPage> {
    let Query(params) = query?;
    let page = catalog(&state).search(params).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/public/planeaciones/:id
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<PublicPlaneacion> {
    let id = parse_id(&id)?;
    let document = catalog(&state).get_by_id(id).await?;
    Ok(ApiResponse::success(document))
}

/// GET /api/public/planeaciones/slug/:slug
pub async fn get_by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<PublicPlaneacion> {
    let document = catalog(&state).get_by_slug(&slug).await?;
    Ok(ApiResponse::success(document))
}

/// GET /api/public/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<PublicStats> {
    let stats = catalog(&state).stats().await?;
    Ok(ApiResponse::success(stats))
}
