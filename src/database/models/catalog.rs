use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Normalized public search filters. At least one text filter is set by the
/// time a store sees this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub profesor: Option<String>,
    pub unidad: Option<String>,
    pub ua: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PublicSearchItem {
    pub id: i64,
    pub nombre_planeacion: String,
    pub unidad_aprendizaje: String,
    pub profesor: String,
    pub unidad_academica: String,
    pub unidad_academica_abreviatura: String,
    pub updated_at: DateTime<Utc>,
    pub slug: String,
}

/// How a public document is addressed.
#[derive(Debug, Clone, PartialEq)]
pub enum PublicLookup {
    Id(i64),
    Slug(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DatosGeneralesPublicos {
    pub periodo_escolar: Option<String>,
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
    pub unidad_aprendizaje_nombre: Option<String>,
    pub creditos_tepic: Option<f64>,
    pub creditos_satca: Option<f64>,
}

impl DatosGeneralesPublicos {
    pub fn from_datos(datos: &super::DatosGenerales, asignatura: Option<String>) -> Self {
        Self {
            periodo_escolar: datos.periodo.clone(),
            plan_estudios_anio: datos.plan_estudios_anio.clone(),
            semestre_nivel: datos.semestre_nivel.clone(),
            grupos: datos.grupos.clone(),
            programa_academico: datos.programa_academico.clone(),
            academia: datos.academia.clone(),
            area_formacion: datos.area_formacion.clone(),
            modalidad: datos.modalidad.clone(),
            sesiones_por_semestre: datos.sesiones_por_semestre,
            sesiones_aula: datos.sesiones_aula,
            sesiones_laboratorio: datos.sesiones_laboratorio,
            sesiones_clinica: datos.sesiones_clinica,
            sesiones_otro: datos.sesiones_otro,
            horas_teoria: datos.horas_teoria,
            horas_practica: datos.horas_practica,
            horas_aula: datos.horas_aula,
            horas_laboratorio: datos.horas_laboratorio,
            horas_clinica: datos.horas_clinica,
            horas_otro: datos.horas_otro,
            horas_total: datos.horas_total,
            unidad_aprendizaje_nombre: asignatura,
            creditos_tepic: datos.creditos_tepic,
            creditos_satca: datos.creditos_satca,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RelacionesEjes {
    pub antecedentes: Option<String>,
    pub laterales: Option<String>,
    pub subsecuentes: Option<String>,
    pub ejes_compromiso_social_sustentabilidad: Option<String>,
    pub ejes_perspectiva_genero: Option<String>,
    pub ejes_internacionalizacion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrganizacionDidactica {
    pub org_proposito: Option<String>,
    pub org_estrategia: Option<String>,
    pub org_metodos: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Plagio {
    pub plagio_ithenticate: Option<bool>,
    pub plagio_turnitin: Option<bool>,
    pub plagio_otro: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Referencia {
    pub id: i64,
    pub cita_apa: String,
    pub unidades_aplica: Option<String>,
    pub tipo: Option<String>,
}

/// Flat thematic unit row as stored; `UnidadTematica` is the nested form.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct UnidadTematicaRow {
    pub id: i64,
    pub numero: i32,
    pub nombre_unidad_tematica: Option<String>,
    pub unidad_competencia: Option<String>,
    pub periodo_del: Option<NaiveDate>,
    pub periodo_al: Option<NaiveDate>,
    pub horas_aula: Option<f64>,
    pub horas_laboratorio: Option<f64>,
    pub horas_taller: Option<f64>,
    pub horas_clinica: Option<f64>,
    pub horas_otro: Option<f64>,
    pub sesiones_aula: Option<i32>,
    pub sesiones_laboratorio: Option<i32>,
    pub sesiones_taller: Option<i32>,
    pub sesiones_clinica: Option<i32>,
    pub sesiones_otro: Option<i32>,
    pub sesiones_totales: Option<i32>,
    pub porcentaje: Option<f64>,
    pub periodo_registro_eval: Option<String>,
    pub aprendizajes_esperados: Option<String>,
    pub precisiones: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct SesionDidacticaRow {
    pub id: i64,
    pub unidad_tematica_id: i64,
    pub numero_sesion: i32,
    pub temas_subtemas: Option<String>,
    pub actividades_inicio: Option<String>,
    pub actividades_desarrollo: Option<String>,
    pub actividades_cierre: Option<String>,
    pub recursos: Option<String>,
    pub evidencias: Option<String>,
    pub instrumentos: Option<String>,
    pub valor_porcentual: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodoDesarrollo {
    pub del: Option<NaiveDate>,
    pub al: Option<NaiveDate>,
}

/// Per-space breakdown, used for both hours and session counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PorEspacio<T> {
    pub aula: Option<T>,
    pub laboratorio: Option<T>,
    pub taller: Option<T>,
    pub clinica: Option<T>,
    pub otro: Option<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actividades {
    pub inicio: Option<String>,
    pub desarrollo: Option<String>,
    pub cierre: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BloqueSesion {
    pub id: i64,
    pub numero_sesion: i32,
    pub temas_subtemas: Option<String>,
    pub actividades: Actividades,
    pub recursos: Option<String>,
    pub evidencias: Option<String>,
    pub instrumentos: Option<String>,
    pub valor_porcentual: Option<f64>,
}

impl From<SesionDidacticaRow> for BloqueSesion {
    fn from(row: SesionDidacticaRow) -> Self {
        Self {
            id: row.id,
            numero_sesion: row.numero_sesion,
            temas_subtemas: row.temas_subtemas,
            actividades: Actividades {
                inicio: row.actividades_inicio,
                desarrollo: row.actividades_desarrollo,
                cierre: row.actividades_cierre,
            },
            recursos: row.recursos,
            evidencias: row.evidencias,
            instrumentos: row.instrumentos,
            valor_porcentual: row.valor_porcentual,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnidadTematica {
    pub id: i64,
    pub numero: i32,
    pub nombre_unidad_tematica: Option<String>,
    pub unidad_competencia: Option<String>,
    pub periodo_desarrollo: PeriodoDesarrollo,
    pub horas: PorEspacio<f64>,
    pub sesiones_por_espacio: PorEspacio<i32>,
    pub sesiones_totales: Option<i32>,
    pub porcentaje: Option<f64>,
    pub periodo_registro_eval: Option<String>,
    pub aprendizajes_esperados: Option<String>,
    pub precisiones: Option<String>,
    pub bloques: Vec<BloqueSesion>,
}

impl UnidadTematica {
    pub fn from_row(row: UnidadTematicaRow, bloques: Vec<BloqueSesion>) -> Self {
        Self {
            id: row.id,
            numero: row.numero,
            nombre_unidad_tematica: row.nombre_unidad_tematica,
            unidad_competencia: row.unidad_competencia,
            periodo_desarrollo: PeriodoDesarrollo {
                del: row.periodo_del,
                al: row.periodo_al,
            },
            horas: PorEspacio {
                aula: row.horas_aula,
                laboratorio: row.horas_laboratorio,
                taller: row.horas_taller,
                clinica: row.horas_clinica,
                otro: row.horas_otro,
            },
            sesiones_por_espacio: PorEspacio {
                aula: row.sesiones_aula,
                laboratorio: row.sesiones_laboratorio,
                taller: row.sesiones_taller,
                clinica: row.sesiones_clinica,
                otro: row.sesiones_otro,
            },
            sesiones_totales: row.sesiones_totales,
            porcentaje: row.porcentaje,
            periodo_registro_eval: row.periodo_registro_eval,
            aprendizajes_esperados: row.aprendizajes_esperados,
            precisiones: row.precisiones,
            bloques,
        }
    }
}

/// Full read-only view of a finalized document. The header columns come
/// from one joined row; `referencias` and `unidades_tematicas` are attached
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PublicPlaneacion {
    pub id: i64,
    pub docente_id: i64,
    pub unidad_academica_id: i64,
    pub nombre_planeacion: String,
    pub slug: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub secciones_completas: Option<Value>,
    pub profesor: String,
    pub unidad_academica: String,
    pub unidad_academica_abreviatura: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub datos_generales: DatosGeneralesPublicos,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub relaciones: RelacionesEjes,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub organizacion: OrganizacionDidactica,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub plagio: Plagio,
    #[sqlx(skip)]
    pub referencias: Vec<Referencia>,
    #[sqlx(skip)]
    pub unidades_tematicas: Vec<UnidadTematica>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PublicStats {
    pub planeaciones_total: i64,
    pub planeaciones_finalizadas: i64,
    pub docentes_participantes: i64,
    pub unidades_tematicas_total: i64,
    pub sesiones_didacticas_total: i64,
    pub ultima_actualizacion: Option<DateTime<Utc>>,
    pub ultima_publicacion: Option<DateTime<Utc>>,
}
