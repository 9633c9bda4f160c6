use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

pub const STATUS_BORRADOR: &str = "borrador";
pub const STATUS_FINALIZADA: &str = "finalizada";
pub const KNOWN_STATUSES: [&str; 2] = [STATUS_BORRADOR, STATUS_FINALIZADA];

/// Title given to documents created without one.
pub const UNTITLED_PLANEACION: &str = "Planeación sin título";

/// Row of the owner's document listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PlaneacionSummary {
    pub id: i64,
    pub docente_id: i64,
    pub unidad_academica_id: i64,
    pub nombre_planeacion: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Planeacion {
    pub id: i64,
    pub docente_id: i64,
    pub unidad_academica_id: i64,
    pub nombre_planeacion: String,
    pub asignatura: Option<String>,
    pub slug: Option<String>,
    pub status: String,
    pub secciones_completas: Option<Value>,
    pub finalizada_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Planeacion {
    pub fn summary(&self) -> PlaneacionSummary {
        PlaneacionSummary {
            id: self.id,
            docente_id: self.docente_id,
            unidad_academica_id: self.unidad_academica_id,
            nombre_planeacion: self.nombre_planeacion.clone(),
            status: self.status.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Partial update. `None` leaves the column untouched; `slug` is only
/// written when the document does not have one yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaneacionPatch {
    pub nombre_planeacion: Option<String>,
    pub status: Option<String>,
    pub secciones_completas: Option<Value>,
    pub slug: Option<String>,
}

/// General data block attached 1:1 to a document. Writes replace every
/// column, so an omitted field is stored as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct DatosGenerales {
    pub periodo: Option<String>,
    pub plan_estudios_anio: Option<String>,
    pub semestre_nivel: Option<String>,
    pub grupos: Option<String>,
    pub programa_academico: Option<String>,
    pub academia: Option<String>,
    pub area_formacion: Option<String>,
    pub modalidad: Option<String>,
    pub sesiones_por_semestre: Option<i32>,
    pub sesiones_aula: Option<i32>,
    pub sesiones_laboratorio: Option<i32>,
    pub sesiones_clinica: Option<i32>,
    pub sesiones_otro: Option<i32>,
    pub horas_teoria: Option<f64>,
    pub horas_practica: Option<f64>,
    pub horas_aula: Option<f64>,
    pub horas_laboratorio: Option<f64>,
    pub horas_clinica: Option<f64>,
    pub horas_otro: Option<f64>,
    pub horas_total: Option<f64>,
    pub creditos_tepic: Option<f64>,
    pub creditos_satca: Option<f64>,
    pub proposito: Option<String>,
    pub metodologia: Option<String>,
    pub consideraciones: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DatosGeneralesRow {
    pub id: i64,
    #[sqlx(flatten)]
    pub datos: DatosGenerales,
}

/// Body of a general data write: the subject name plus the block itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatosGeneralesInput {
    #[serde(default)]
    pub asignatura: Option<String>,
    #[serde(flatten)]
    pub datos: DatosGenerales,
}

/// General data as returned to the owner. `id` is null until first saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatosGeneralesView {
    pub id: Option<i64>,
    pub planeacion_id: i64,
    pub asignatura: Option<String>,
    #[serde(flatten)]
    pub datos: DatosGenerales,
}
