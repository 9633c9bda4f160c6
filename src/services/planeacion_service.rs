use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::database::models::{
    DatosGeneralesInput, DatosGeneralesView, Planeacion, PlaneacionPatch, PlaneacionSummary, KNOWN_STATUSES,
    STATUS_FINALIZADA, UNTITLED_PLANEACION,
};
use crate::database::{DatabaseError, Store};
use crate::services::slug::slugify;

#[derive(Debug, Error)]
pub enum PlaneacionError {
    /// Covers both "does not exist" and "owned by someone else".
    #[error("planeación not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatePlaneacionRequest {
    pub nombre_planeacion: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePlaneacionRequest {
    pub nombre_planeacion: Option<String>,
    pub status: Option<String>,
    pub secciones_completas: Option<Value>,
}

/// Owner-scoped document lifecycle. Every call takes the caller's user id and
/// never touches rows owned by anyone else.
pub struct PlaneacionService {
    store: Arc<dyn Store>,
}

impl PlaneacionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, owner_id: i64) -> Result<Vec<PlaneacionSummary>, PlaneacionError> {
        Ok(self.store.list_planeaciones(owner_id).await?)
    }

    /// The org unit comes from the caller's token, never from the request body.
    pub async fn create(
        &self,
        owner_id: i64,
        unidad_id: i64,
        request: CreatePlaneacionRequest,
    ) -> Result<i64, PlaneacionError> {
        let nombre = request
            .nombre_planeacion
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNTITLED_PLANEACION.to_string());

        let id = self.store.insert_planeacion(owner_id, unidad_id, &nombre).await?;
        info!(planeacion_id = id, owner_id, "Created planeación");
        Ok(id)
    }

    pub async fn get(&self, id: i64, owner_id: i64) -> Result<Planeacion, PlaneacionError> {
        self.store
            .find_planeacion(id, owner_id)
            .await?
            .ok_or(PlaneacionError::NotFound)
    }

    /// Partial update: absent fields keep their stored value. Reaching
    /// `finalizada` stamps the slug if the document has none yet.
    pub async fn update(
        &self,
        id: i64,
        owner_id: i64,
        request: UpdatePlaneacionRequest,
    ) -> Result<(), PlaneacionError> {
        if let Some(status) = request.status.as_deref() {
            if !KNOWN_STATUSES.contains(&status) {
                warn!(planeacion_id = id, status, "Storing unrecognized planeación status");
            }
        }

        let mut patch = PlaneacionPatch {
            nombre_planeacion: request.nombre_planeacion,
            status: request.status,
            secciones_completas: request.secciones_completas,
            slug: None,
        };

        if patch.status.as_deref() == Some(STATUS_FINALIZADA) {
            let current = self.get(id, owner_id).await?;
            if current.slug.is_none() {
                let title = patch
                    .nombre_planeacion
                    .as_deref()
                    .unwrap_or(&current.nombre_planeacion);
                patch.slug = Some(slugify(title, id));
            }
        }

        if !self.store.update_planeacion(id, owner_id, &patch).await? {
            return Err(PlaneacionError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<(), PlaneacionError> {
        if !self.store.delete_planeacion(id, owner_id).await? {
            return Err(PlaneacionError::NotFound);
        }
        info!(planeacion_id = id, owner_id, "Deleted planeación");
        Ok(())
    }

    /// General data for an owned document; all fields null before the first save.
    pub async fn datos_generales(&self, id: i64, owner_id: i64) -> Result<DatosGeneralesView, PlaneacionError> {
        let planeacion = self.get(id, owner_id).await?;
        let row = self.store.find_datos_generales(id).await?;

        Ok(DatosGeneralesView {
            id: row.as_ref().map(|r| r.id),
            planeacion_id: id,
            asignatura: planeacion.asignatura,
            datos: row.map(|r| r.datos).unwrap_or_default(),
        })
    }

    /// Replaces the general data block of an owned document.
    pub async fn save_datos_generales(
        &self,
        id: i64,
        owner_id: i64,
        input: DatosGeneralesInput,
    ) -> Result<(), PlaneacionError> {
        self.get(id, owner_id).await?;

        let asignatura = input
            .asignatura
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());
        self.store
            .upsert_datos_generales(id, asignatura, &input.datos)
            .await?;
        Ok(())
    }
}
