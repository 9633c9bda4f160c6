use axum::extract::{rejection::QueryRejection, Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::database::models::UnidadAcademica;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UnidadesQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnidadesList {
    pub items: Vec<UnidadAcademica>,
    pub total: usize,
}

/// GET /api/unidades?q= - org units by name, optionally filtered
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<UnidadesQuery>, QueryRejection>,
) -> ApiResult<UnidadesList> {
    let Query(query) = query?;
    let filter = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let items = state.store.list_unidades(filter).await?;
    let total = items.len();
    Ok(ApiResponse::success(UnidadesList { items, total }))
}

/// GET /api/unidades/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<UnidadAcademica> {
    let id = parse_id(&id)?;
    let unidad = state
        .store
        .find_unidad(id)
        .await?
        .ok_or_else(|| ApiError::not_found("unidad académica not found"))?;
    Ok(ApiResponse::success(unidad))
}
