use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::manager::DatabaseManager;
use super::models::{
    DatosGenerales, DatosGeneralesRow, NewUser, Planeacion, PlaneacionPatch, PlaneacionSummary, PublicLookup,
    PublicPlaneacion, PublicSearchItem, PublicStats, Referencia, SearchFilters, SesionDidacticaRow,
    UnidadAcademica, UnidadTematicaRow, User, UserCredentials, ROLE_PROFESOR, STATUS_FINALIZADA,
};
use super::repository::{
    CatalogRepository, HealthCheck, PlaneacionRepository, StoreResult, UnidadRepository, UserRepository,
};

const USER_COLUMNS: &str =
    "id, unidad_id, nombre_completo, email, role::text AS role, is_active, created_at, updated_at";

const PLANEACION_COLUMNS: &str = "id, docente_id, unidad_academica_id, nombre_planeacion, asignatura, slug, status, \
     secciones_completas, finalizada_at, created_at, updated_at";

const DATOS_GENERALES_COLUMNS: &str = "periodo, plan_estudios_anio, semestre_nivel, grupos, programa_academico, \
     academia, area_formacion, modalidad, sesiones_por_semestre, sesiones_aula, sesiones_laboratorio, \
     sesiones_clinica, sesiones_otro, horas_teoria, horas_practica, horas_aula, horas_laboratorio, horas_clinica, \
     horas_otro, horas_total, creditos_tepic, creditos_satca, proposito, metodologia, consideraciones";

const PUBLIC_HEADER_SELECT: &str = r#"
SELECT
  p.id, p.docente_id, p.unidad_academica_id, p.nombre_planeacion, p.slug, p.status,
  p.created_at, p.updated_at, p.secciones_completas,
  u.nombre_completo AS profesor,
  ua.nombre AS unidad_academica,
  ua.abreviatura AS unidad_academica_abreviatura,
  dg.periodo AS periodo_escolar, dg.plan_estudios_anio, dg.semestre_nivel, dg.grupos,
  dg.programa_academico, dg.academia, dg.area_formacion, dg.modalidad,
  dg.sesiones_por_semestre, dg.sesiones_aula, dg.sesiones_laboratorio, dg.sesiones_clinica, dg.sesiones_otro,
  dg.horas_teoria, dg.horas_practica, dg.horas_aula, dg.horas_laboratorio, dg.horas_clinica, dg.horas_otro,
  dg.horas_total, p.asignatura AS unidad_aprendizaje_nombre, dg.creditos_tepic, dg.creditos_satca,
  re.antecedentes, re.laterales, re.subsecuentes, re.ejes_compromiso_social_sustentabilidad,
  re.ejes_perspectiva_genero, re.ejes_internacionalizacion,
  org.proposito AS org_proposito, org.estrategia AS org_estrategia, org.metodos AS org_metodos,
  pl.ithenticate AS plagio_ithenticate, pl.turnitin AS plagio_turnitin, pl.otro AS plagio_otro
FROM planeaciones p
JOIN usuarios u ON u.id = p.docente_id
JOIN unidades_academicas ua ON ua.id = p.unidad_academica_id
LEFT JOIN planeacion_datos_generales dg ON dg.planeacion_id = p.id
LEFT JOIN planeacion_relaciones_ejes re ON re.planeacion_id = p.id
LEFT JOIN planeacion_organizacion org ON org.planeacion_id = p.id
LEFT JOIN planeacion_plagio pl ON pl.planeacion_id = p.id
WHERE p.status = $1
"#;

const PUBLIC_STATS_SQL: &str = r#"
SELECT
  (SELECT COUNT(*)::bigint FROM planeaciones) AS planeaciones_total,
  (SELECT COUNT(*)::bigint FROM planeaciones WHERE status = $1) AS planeaciones_finalizadas,
  (SELECT COUNT(DISTINCT docente_id)::bigint FROM planeaciones) AS docentes_participantes,
  (SELECT COUNT(*)::bigint FROM unidades_tematicas) AS unidades_tematicas_total,
  (SELECT COUNT(*)::bigint FROM sesiones_didacticas) AS sesiones_didacticas_total,
  (SELECT MAX(updated_at) FROM planeaciones) AS ultima_actualizacion,
  (SELECT MAX(finalizada_at) FROM planeaciones WHERE status = $1) AS ultima_publicacion
"#;

/// Postgres-backed store over a single shared pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        DatabaseManager::close(&self.pool).await;
    }
}

/// Substring ILIKE pattern with `%`, `_` and `\` in user input matched literally.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM usuarios WHERE email = $1");
        let row = sqlx::query_as::<_, UserCredentials>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios WHERE id = $1");
        let row = sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM usuarios WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO usuarios (unidad_id, nombre_completo, email, password_hash, role, is_active) \
             VALUES ($1, $2, $3, $4, $5::user_role, true) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(user.unidad_id)
            .bind(&user.nombre_completo)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(ROLE_PROFESOR)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl UnidadRepository for PgStore {
    async fn list_unidades(&self, query: Option<&str>) -> StoreResult<Vec<UnidadAcademica>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id, nombre, abreviatura FROM unidades_academicas");
        if let Some(q) = query {
            let pattern = like_pattern(q);
            qb.push(" WHERE nombre ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR COALESCE(abreviatura, '') ILIKE ")
                .push_bind(pattern);
        }
        qb.push(" ORDER BY nombre ASC");

        let rows = qb.build_query_as::<UnidadAcademica>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn find_unidad(&self, id: i64) -> StoreResult<Option<UnidadAcademica>> {
        let row = sqlx::query_as::<_, UnidadAcademica>(
            "SELECT id, nombre, abreviatura FROM unidades_academicas WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn unidad_exists(&self, id: i64) -> StoreResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM unidades_academicas WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl PlaneacionRepository for PgStore {
    async fn list_planeaciones(&self, owner_id: i64) -> StoreResult<Vec<PlaneacionSummary>> {
        let rows = sqlx::query_as::<_, PlaneacionSummary>(
            "SELECT id, docente_id, unidad_academica_id, nombre_planeacion, status, created_at, updated_at \
             FROM planeaciones WHERE docente_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_planeacion(&self, owner_id: i64, unidad_id: i64, nombre: &str) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO planeaciones (docente_id, unidad_academica_id, nombre_planeacion) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(owner_id)
        .bind(unidad_id)
        .bind(nombre)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_planeacion(&self, id: i64, owner_id: i64) -> StoreResult<Option<Planeacion>> {
        let sql = format!("SELECT {PLANEACION_COLUMNS} FROM planeaciones WHERE id = $1 AND docente_id = $2");
        let row = sqlx::query_as::<_, Planeacion>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_planeacion(&self, id: i64, owner_id: i64, patch: &PlaneacionPatch) -> StoreResult<bool> {
        // SET expressions all read the pre-update row, so `status` below is the old value.
        let result = sqlx::query(
            r#"
UPDATE planeaciones SET
  nombre_planeacion = COALESCE($1, nombre_planeacion),
  finalizada_at = CASE
    WHEN $2::text = $3 AND status IS DISTINCT FROM $3 THEN now()
    ELSE finalizada_at
  END,
  status = COALESCE($2, status),
  secciones_completas = COALESCE($4, secciones_completas),
  slug = COALESCE(slug, $5),
  updated_at = now()
WHERE id = $6 AND docente_id = $7
"#,
        )
        .bind(patch.nombre_planeacion.as_deref())
        .bind(patch.status.as_deref())
        .bind(STATUS_FINALIZADA)
        .bind(patch.secciones_completas.clone())
        .bind(patch.slug.as_deref())
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_planeacion(&self, id: i64, owner_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM planeaciones WHERE id = $1 AND docente_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_datos_generales(&self, planeacion_id: i64) -> StoreResult<Option<DatosGeneralesRow>> {
        let sql = format!(
            "SELECT id, {DATOS_GENERALES_COLUMNS} FROM planeacion_datos_generales WHERE planeacion_id = $1"
        );
        let row = sqlx::query_as::<_, DatosGeneralesRow>(&sql)
            .bind(planeacion_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert_datos_generales(
        &self,
        planeacion_id: i64,
        asignatura: Option<&str>,
        datos: &DatosGenerales,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE planeaciones SET asignatura = $1, updated_at = now() WHERE id = $2")
            .bind(asignatura)
            .bind(planeacion_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
INSERT INTO planeacion_datos_generales (
  planeacion_id, periodo, plan_estudios_anio, semestre_nivel, grupos, programa_academico,
  academia, area_formacion, modalidad, sesiones_por_semestre, sesiones_aula, sesiones_laboratorio,
  sesiones_clinica, sesiones_otro, horas_teoria, horas_practica, horas_aula, horas_laboratorio,
  horas_clinica, horas_otro, horas_total, creditos_tepic, creditos_satca, proposito, metodologia,
  consideraciones, updated_at
) VALUES (
  $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
  $21, $22, $23, $24, $25, $26, now()
)
ON CONFLICT (planeacion_id) DO UPDATE SET
  periodo = EXCLUDED.periodo,
  plan_estudios_anio = EXCLUDED.plan_estudios_anio,
  semestre_nivel = EXCLUDED.semestre_nivel,
  grupos = EXCLUDED.grupos,
  programa_academico = EXCLUDED.programa_academico,
  academia = EXCLUDED.academia,
  area_formacion = EXCLUDED.area_formacion,
  modalidad = EXCLUDED.modalidad,
  sesiones_por_semestre = EXCLUDED.sesiones_por_semestre,
  sesiones_aula = EXCLUDED.sesiones_aula,
  sesiones_laboratorio = EXCLUDED.sesiones_laboratorio,
  sesiones_clinica = EXCLUDED.sesiones_clinica,
  sesiones_otro = EXCLUDED.sesiones_otro,
  horas_teoria = EXCLUDED.horas_teoria,
  horas_practica = EXCLUDED.horas_practica,
  horas_aula = EXCLUDED.horas_aula,
  horas_laboratorio = EXCLUDED.horas_laboratorio,
  horas_clinica = EXCLUDED.horas_clinica,
  horas_otro = EXCLUDED.horas_otro,
  horas_total = EXCLUDED.horas_total,
  creditos_tepic = EXCLUDED.creditos_tepic,
  creditos_satca = EXCLUDED.creditos_satca,
  proposito = EXCLUDED.proposito,
  metodologia = EXCLUDED.metodologia,
  consideraciones = EXCLUDED.consideraciones,
  updated_at = now()
"#,
        )
        .bind(planeacion_id)
        .bind(&datos.periodo)
        .bind(&datos.plan_estudios_anio)
        .bind(&datos.semestre_nivel)
        .bind(&datos.grupos)
        .bind(&datos.programa_academico)
        .bind(&datos.academia)
        .bind(&datos.area_formacion)
        .bind(&datos.modalidad)
        .bind(datos.sesiones_por_semestre)
        .bind(datos.sesiones_aula)
        .bind(datos.sesiones_laboratorio)
        .bind(datos.sesiones_clinica)
        .bind(datos.sesiones_otro)
        .bind(datos.horas_teoria)
        .bind(datos.horas_practica)
        .bind(datos.horas_aula)
        .bind(datos.horas_laboratorio)
        .bind(datos.horas_clinica)
        .bind(datos.horas_otro)
        .bind(datos.horas_total)
        .bind(datos.creditos_tepic)
        .bind(datos.creditos_satca)
        .bind(&datos.proposito)
        .bind(&datos.metodologia)
        .bind(&datos.consideraciones)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn search_public(&self, filters: &SearchFilters) -> StoreResult<Vec<PublicSearchItem>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
SELECT
  p.id,
  p.nombre_planeacion,
  COALESCE(p.asignatura, '') AS unidad_aprendizaje,
  u.nombre_completo AS profesor,
  ua.nombre AS unidad_academica,
  COALESCE(ua.abreviatura, '') AS unidad_academica_abreviatura,
  p.updated_at,
  COALESCE(p.slug, '') AS slug
FROM planeaciones p
JOIN usuarios u ON u.id = p.docente_id
JOIN unidades_academicas ua ON ua.id = p.unidad_academica_id
WHERE p.status = "#,
        );
        qb.push_bind(STATUS_FINALIZADA);

        if let Some(profesor) = &filters.profesor {
            qb.push(" AND u.nombre_completo ILIKE ").push_bind(like_pattern(profesor));
        }
        if let Some(unidad) = &filters.unidad {
            qb.push(" AND COALESCE(p.asignatura, '') ILIKE ").push_bind(like_pattern(unidad));
        }
        if let Some(ua) = &filters.ua {
            let pattern = like_pattern(ua);
            qb.push(" AND (ua.nombre ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR COALESCE(ua.abreviatura, '') ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        qb.push(" ORDER BY p.updated_at DESC, p.id DESC LIMIT ")
            .push_bind(filters.limit)
            .push(" OFFSET ")
            .push_bind(filters.offset);

        let rows = qb.build_query_as::<PublicSearchItem>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn find_public_header(&self, lookup: &PublicLookup) -> StoreResult<Option<PublicPlaneacion>> {
        let row = match lookup {
            PublicLookup::Id(id) => {
                let sql = format!("{PUBLIC_HEADER_SELECT} AND p.id = $2");
                sqlx::query_as::<_, PublicPlaneacion>(&sql)
                    .bind(STATUS_FINALIZADA)
                    .bind(*id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            PublicLookup::Slug(slug) => {
                let sql = format!("{PUBLIC_HEADER_SELECT} AND p.slug = $2 LIMIT 1");
                sqlx::query_as::<_, PublicPlaneacion>(&sql)
                    .bind(STATUS_FINALIZADA)
                    .bind(slug.as_str())
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        Ok(row)
    }

    async fn list_referencias(&self, planeacion_id: i64) -> StoreResult<Vec<Referencia>> {
        let rows = sqlx::query_as::<_, Referencia>(
            "SELECT id, cita_apa, unidades_aplica, tipo FROM planeacion_referencias \
             WHERE planeacion_id = $1 ORDER BY id",
        )
        .bind(planeacion_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_unidades_tematicas(&self, planeacion_id: i64) -> StoreResult<Vec<UnidadTematicaRow>> {
        let rows = sqlx::query_as::<_, UnidadTematicaRow>(
            r#"
SELECT id, numero, nombre_unidad_tematica, unidad_competencia, periodo_del, periodo_al,
       horas_aula, horas_laboratorio, horas_taller, horas_clinica, horas_otro,
       sesiones_aula, sesiones_laboratorio, sesiones_taller, sesiones_clinica, sesiones_otro,
       sesiones_totales, porcentaje, periodo_registro_eval, aprendizajes_esperados, precisiones
FROM unidades_tematicas
WHERE planeacion_id = $1
ORDER BY numero, id
"#,
        )
        .bind(planeacion_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_sesiones(&self, unidad_ids: &[i64]) -> StoreResult<Vec<SesionDidacticaRow>> {
        if unidad_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, SesionDidacticaRow>(
            r#"
SELECT id, unidad_tematica_id, numero_sesion, temas_subtemas, actividades_inicio,
       actividades_desarrollo, actividades_cierre, recursos, evidencias, instrumentos, valor_porcentual
FROM sesiones_didacticas
WHERE unidad_tematica_id = ANY($1)
ORDER BY unidad_tematica_id, numero_sesion, id
"#,
        )
        .bind(unidad_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn public_stats(&self) -> StoreResult<PublicStats> {
        let stats = sqlx::query_as::<_, PublicStats>(PUBLIC_STATS_SQL)
            .bind(STATUS_FINALIZADA)
            .fetch_one(&self.pool)
            .await?;
        Ok(stats)
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        DatabaseManager::ping(&self.pool).await
    }
}
