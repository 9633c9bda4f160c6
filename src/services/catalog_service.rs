use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::CatalogConfig;
use crate::database::models::{
    BloqueSesion, PublicLookup, PublicPlaneacion, PublicSearchItem, PublicStats, Referencia, SearchFilters,
    SesionDidacticaRow, UnidadTematica, UnidadTematicaRow,
};
use crate::database::{DatabaseError, Store};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("at least one filter is required: profesor, unidad or ua")]
    MissingFilter,

    #[error("slug is required")]
    MissingSlug,

    #[error("planeación not found or not published")]
    NotFound,

    #[error("public stats timed out after {0}s")]
    StatsTimeout(u64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Raw query string of a public search; numbers stay strings so malformed
/// values fall back to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub profesor: Option<String>,
    pub unidad: Option<String>,
    pub ua: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub items: Vec<PublicSearchItem>,
    pub limit: i64,
    pub offset: i64,
}

/// Unauthenticated read side. Only documents whose status is exactly
/// `finalizada` are ever returned.
pub struct CatalogService {
    store: Arc<dyn Store>,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, config: CatalogConfig) -> Self {
        Self { store, config }
    }

    pub async fn search(&self, params: SearchParams) -> Result<SearchPage, CatalogError> {
        let filters = normalize_search(params, &self.config)?;
        let items = self.store.search_public(&filters).await?;

        Ok(SearchPage {
            items,
            limit: filters.limit,
            offset: filters.offset,
        })
    }

    pub async fn get_by_id(&self, id: i64) -> Result<PublicPlaneacion, CatalogError> {
        self.get(PublicLookup::Id(id)).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<PublicPlaneacion, CatalogError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(CatalogError::MissingSlug);
        }
        self.get(PublicLookup::Slug(slug.to_string())).await
    }

    async fn get(&self, lookup: PublicLookup) -> Result<PublicPlaneacion, CatalogError> {
        let header = self
            .store
            .find_public_header(&lookup)
            .await?
            .ok_or(CatalogError::NotFound)?;

        let referencias = self.store.list_referencias(header.id).await?;
        let unidades = self.store.list_unidades_tematicas(header.id).await?;
        let unidad_ids: Vec<i64> = unidades.iter().map(|u| u.id).collect();
        let sesiones = self.store.list_sesiones(&unidad_ids).await?;

        Ok(assemble(header, referencias, unidades, sesiones))
    }

    /// Aggregate counters, bounded by the configured deadline.
    pub async fn stats(&self) -> Result<PublicStats, CatalogError> {
        let deadline = Duration::from_secs(self.config.stats_timeout_secs);
        match tokio::time::timeout(deadline, self.store.public_stats()).await {
            Ok(stats) => Ok(stats?),
            Err(_) => Err(CatalogError::StatsTimeout(self.config.stats_timeout_secs)),
        }
    }
}

/// Trims filters, requires at least one, and clamps paging: a positive limit
/// is capped at `max_limit`, anything else uses `default_limit`; a negative or
/// unparseable offset becomes 0.
pub fn normalize_search(params: SearchParams, config: &CatalogConfig) -> Result<SearchFilters, CatalogError> {
    let clean = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let profesor = clean(params.profesor);
    let unidad = clean(params.unidad);
    let ua = clean(params.ua);
    if profesor.is_none() && unidad.is_none() && ua.is_none() {
        return Err(CatalogError::MissingFilter);
    }

    let limit = match params.limit.as_deref().map(str::trim).and_then(|l| l.parse::<i64>().ok()) {
        Some(n) if n > 0 => n.min(config.max_limit),
        _ => config.default_limit,
    };
    let offset = params
        .offset
        .as_deref()
        .map(str::trim)
        .and_then(|o| o.parse::<i64>().ok())
        .filter(|o| *o >= 0)
        .unwrap_or(0);

    Ok(SearchFilters {
        profesor,
        unidad,
        ua,
        limit,
        offset,
    })
}

/// Builds the nested document: references by id, thematic units by number,
/// each unit carrying its sessions by session number.
pub fn assemble(
    mut header: PublicPlaneacion,
    mut referencias: Vec<Referencia>,
    mut unidades: Vec<UnidadTematicaRow>,
    sesiones: Vec<SesionDidacticaRow>,
) -> PublicPlaneacion {
    referencias.sort_by_key(|r| r.id);
    unidades.sort_by_key(|u| (u.numero, u.id));

    let mut by_unidad: HashMap<i64, Vec<SesionDidacticaRow>> = HashMap::new();
    for sesion in sesiones {
        by_unidad.entry(sesion.unidad_tematica_id).or_default().push(sesion);
    }

    header.referencias = referencias;
    header.unidades_tematicas = unidades
        .into_iter()
        .map(|unidad| {
            let mut bloques = by_unidad.remove(&unidad.id).unwrap_or_default();
            bloques.sort_by_key(|s| (s.numero_sesion, s.id));
            let bloques = bloques.into_iter().map(BloqueSesion::from).collect();
            UnidadTematica::from_row(unidad, bloques)
        })
        .collect();
    header
}
