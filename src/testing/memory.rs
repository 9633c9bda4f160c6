use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::database::models::{
    DatosGenerales, DatosGeneralesPublicos, DatosGeneralesRow, NewUser, OrganizacionDidactica, Plagio, Planeacion,
    PlaneacionPatch, PlaneacionSummary, PublicLookup, PublicPlaneacion, PublicSearchItem, PublicStats, Referencia,
    RelacionesEjes, SearchFilters, SesionDidacticaRow, UnidadAcademica, UnidadTematicaRow, User, UserCredentials,
    ROLE_PROFESOR, STATUS_BORRADOR, STATUS_FINALIZADA,
};
use crate::database::repository::{
    CatalogRepository, HealthCheck, PlaneacionRepository, StoreResult, UnidadRepository, UserRepository,
};
use crate::database::DatabaseError;

#[derive(Default)]
struct Tables {
    next_id: i64,
    last_tick: Option<DateTime<Utc>>,
    unidades: BTreeMap<i64, UnidadAcademica>,
    usuarios: BTreeMap<i64, UserCredentials>,
    planeaciones: BTreeMap<i64, Planeacion>,
    datos_generales: Vec<(i64, DatosGeneralesRow)>,
    relaciones: HashMap<i64, RelacionesEjes>,
    organizacion: HashMap<i64, OrganizacionDidactica>,
    plagio: HashMap<i64, Plagio>,
    referencias: Vec<(i64, Referencia)>,
    unidades_tematicas: Vec<(i64, UnidadTematicaRow)>,
    sesiones: Vec<SesionDidacticaRow>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing clock so "newest first" orderings are stable.
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_tick {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_tick = Some(now);
        now
    }

    fn public_header(&self, p: &Planeacion) -> Option<PublicPlaneacion> {
        let docente = self.usuarios.get(&p.docente_id)?;
        let unidad = self.unidades.get(&p.unidad_academica_id)?;
        let datos_generales = match self.datos_generales.iter().find(|(pid, _)| *pid == p.id) {
            Some((_, row)) => DatosGeneralesPublicos::from_datos(&row.datos, p.asignatura.clone()),
            None => DatosGeneralesPublicos {
                unidad_aprendizaje_nombre: p.asignatura.clone(),
                ..Default::default()
            },
        };

        Some(PublicPlaneacion {
            id: p.id,
            docente_id: p.docente_id,
            unidad_academica_id: p.unidad_academica_id,
            nombre_planeacion: p.nombre_planeacion.clone(),
            slug: p.slug.clone(),
            status: p.status.clone(),
            created_at: p.created_at,
            updated_at: p.updated_at,
            secciones_completas: p.secciones_completas.clone(),
            profesor: docente.user.nombre_completo.clone(),
            unidad_academica: unidad.nombre.clone(),
            unidad_academica_abreviatura: unidad.abreviatura.clone(),
            datos_generales,
            relaciones: self.relaciones.get(&p.id).cloned().unwrap_or_default(),
            organizacion: self.organizacion.get(&p.id).cloned().unwrap_or_default(),
            plagio: self.plagio.get(&p.id).cloned().unwrap_or_default(),
            referencias: Vec::new(),
            unidades_tematicas: Vec::new(),
        })
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// In-process store with the same observable rules as the Postgres schema:
/// unique email, org unit foreign keys, column defaults, cascading deletes
/// and finalized-only public reads.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
    stall_stats: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_unidad(&self, nombre: &str, abreviatura: Option<&str>) -> i64 {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        tables.unidades.insert(
            id,
            UnidadAcademica {
                id,
                nombre: nombre.to_string(),
                abreviatura: abreviatura.map(str::to_string),
            },
        );
        id
    }

    pub async fn set_user_active(&self, user_id: i64, active: bool) {
        let mut tables = self.tables.write().await;
        if let Some(credentials) = tables.usuarios.get_mut(&user_id) {
            credentials.user.is_active = active;
        }
    }

    pub async fn remove_user(&self, user_id: i64) {
        self.tables.write().await.usuarios.remove(&user_id);
    }

    pub async fn password_hash(&self, email: &str) -> Option<String> {
        let tables = self.tables.read().await;
        tables
            .usuarios
            .values()
            .find(|c| c.user.email == email)
            .map(|c| c.password_hash.clone())
    }

    pub async fn set_relaciones(&self, planeacion_id: i64, relaciones: RelacionesEjes) {
        self.tables.write().await.relaciones.insert(planeacion_id, relaciones);
    }

    pub async fn set_organizacion(&self, planeacion_id: i64, organizacion: OrganizacionDidactica) {
        self.tables.write().await.organizacion.insert(planeacion_id, organizacion);
    }

    pub async fn set_plagio(&self, planeacion_id: i64, plagio: Plagio) {
        self.tables.write().await.plagio.insert(planeacion_id, plagio);
    }

    pub async fn add_referencia(&self, planeacion_id: i64, mut referencia: Referencia) -> i64 {
        let mut tables = self.tables.write().await;
        referencia.id = tables.next_id();
        let id = referencia.id;
        tables.referencias.push((planeacion_id, referencia));
        id
    }

    pub async fn add_unidad_tematica(&self, planeacion_id: i64, mut unidad: UnidadTematicaRow) -> i64 {
        let mut tables = self.tables.write().await;
        unidad.id = tables.next_id();
        let id = unidad.id;
        tables.unidades_tematicas.push((planeacion_id, unidad));
        id
    }

    pub async fn add_sesion(&self, mut sesion: SesionDidacticaRow) -> i64 {
        let mut tables = self.tables.write().await;
        sesion.id = tables.next_id();
        let id = sesion.id;
        tables.sesiones.push(sesion);
        id
    }

    pub async fn datos_generales_count(&self, planeacion_id: i64) -> usize {
        let tables = self.tables.read().await;
        tables
            .datos_generales
            .iter()
            .filter(|(pid, _)| *pid == planeacion_id)
            .count()
    }

    /// Makes `ping` fail, as if the database were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes `public_stats` hang until the caller gives up.
    pub fn stall_stats(&self, stall: bool) {
        self.stall_stats.store(stall, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let tables = self.tables.read().await;
        Ok(tables.usuarios.values().find(|c| c.user.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.usuarios.get(&id).map(|c| c.user.clone()))
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.usuarios.values().any(|c| c.user.email == email))
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.usuarios.values().any(|c| c.user.email == user.email) {
            return Err(DatabaseError::UniqueViolation("usuarios_email_key".to_string()));
        }
        if !tables.unidades.contains_key(&user.unidad_id) {
            return Err(DatabaseError::Query(
                "insert or update on table \"usuarios\" violates foreign key constraint \"usuarios_unidad_id_fkey\""
                    .to_string(),
            ));
        }

        let id = tables.next_id();
        let now = tables.now();
        let record = User {
            id,
            unidad_id: user.unidad_id,
            nombre_completo: user.nombre_completo,
            email: user.email,
            role: ROLE_PROFESOR.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.usuarios.insert(
            id,
            UserCredentials {
                user: record.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(record)
    }
}

#[async_trait]
impl UnidadRepository for MemoryStore {
    async fn list_unidades(&self, query: Option<&str>) -> StoreResult<Vec<UnidadAcademica>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<UnidadAcademica> = tables
            .unidades
            .values()
            .filter(|u| match query {
                Some(q) => contains_ci(&u.nombre, q) || contains_ci(u.abreviatura.as_deref().unwrap_or(""), q),
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        Ok(rows)
    }

    async fn find_unidad(&self, id: i64) -> StoreResult<Option<UnidadAcademica>> {
        Ok(self.tables.read().await.unidades.get(&id).cloned())
    }

    async fn unidad_exists(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.read().await.unidades.contains_key(&id))
    }
}

#[async_trait]
impl PlaneacionRepository for MemoryStore {
    async fn list_planeaciones(&self, owner_id: i64) -> StoreResult<Vec<PlaneacionSummary>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PlaneacionSummary> = tables
            .planeaciones
            .values()
            .filter(|p| p.docente_id == owner_id)
            .map(Planeacion::summary)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn insert_planeacion(&self, owner_id: i64, unidad_id: i64, nombre: &str) -> StoreResult<i64> {
        let mut tables = self.tables.write().await;
        if !tables.usuarios.contains_key(&owner_id) || !tables.unidades.contains_key(&unidad_id) {
            return Err(DatabaseError::Query(
                "insert or update on table \"planeaciones\" violates foreign key constraint".to_string(),
            ));
        }

        let id = tables.next_id();
        let now = tables.now();
        tables.planeaciones.insert(
            id,
            Planeacion {
                id,
                docente_id: owner_id,
                unidad_academica_id: unidad_id,
                nombre_planeacion: nombre.to_string(),
                asignatura: None,
                slug: None,
                status: STATUS_BORRADOR.to_string(),
                secciones_completas: None,
                finalizada_at: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn find_planeacion(&self, id: i64, owner_id: i64) -> StoreResult<Option<Planeacion>> {
        let tables = self.tables.read().await;
        Ok(tables
            .planeaciones
            .get(&id)
            .filter(|p| p.docente_id == owner_id)
            .cloned())
    }

    async fn update_planeacion(&self, id: i64, owner_id: i64, patch: &PlaneacionPatch) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        let Some(p) = tables.planeaciones.get_mut(&id).filter(|p| p.docente_id == owner_id) else {
            return Ok(false);
        };

        if let Some(nombre) = &patch.nombre_planeacion {
            p.nombre_planeacion = nombre.clone();
        }
        if let Some(status) = &patch.status {
            if status == STATUS_FINALIZADA && p.status != STATUS_FINALIZADA {
                p.finalizada_at = Some(now);
            }
            p.status = status.clone();
        }
        if let Some(secciones) = &patch.secciones_completas {
            p.secciones_completas = Some(secciones.clone());
        }
        if p.slug.is_none() {
            p.slug = patch.slug.clone();
        }
        p.updated_at = now;
        Ok(true)
    }

    async fn delete_planeacion(&self, id: i64, owner_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .planeaciones
            .get(&id)
            .map(|p| p.docente_id == owner_id)
            .unwrap_or(false);
        if !owned {
            return Ok(false);
        }

        tables.planeaciones.remove(&id);
        tables.datos_generales.retain(|(pid, _)| *pid != id);
        tables.relaciones.remove(&id);
        tables.organizacion.remove(&id);
        tables.plagio.remove(&id);
        tables.referencias.retain(|(pid, _)| *pid != id);
        let unit_ids: Vec<i64> = tables
            .unidades_tematicas
            .iter()
            .filter(|(pid, _)| *pid == id)
            .map(|(_, u)| u.id)
            .collect();
        tables.unidades_tematicas.retain(|(pid, _)| *pid != id);
        tables.sesiones.retain(|s| !unit_ids.contains(&s.unidad_tematica_id));
        Ok(true)
    }

    async fn find_datos_generales(&self, planeacion_id: i64) -> StoreResult<Option<DatosGeneralesRow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .datos_generales
            .iter()
            .find(|(pid, _)| *pid == planeacion_id)
            .map(|(_, row)| row.clone()))
    }

    async fn upsert_datos_generales(
        &self,
        planeacion_id: i64,
        asignatura: Option<&str>,
        datos: &DatosGenerales,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        let Some(p) = tables.planeaciones.get_mut(&planeacion_id) else {
            return Err(DatabaseError::Query(
                "insert or update on table \"planeacion_datos_generales\" violates foreign key constraint".to_string(),
            ));
        };
        p.asignatura = asignatura.map(str::to_string);
        p.updated_at = now;

        if let Some((_, row)) = tables.datos_generales.iter_mut().find(|(pid, _)| *pid == planeacion_id) {
            row.datos = datos.clone();
            return Ok(());
        }

        let id = tables.next_id();
        tables.datos_generales.push((
            planeacion_id,
            DatosGeneralesRow {
                id,
                datos: datos.clone(),
            },
        ));
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn search_public(&self, filters: &SearchFilters) -> StoreResult<Vec<PublicSearchItem>> {
        let tables = self.tables.read().await;
        let mut items: Vec<PublicSearchItem> = tables
            .planeaciones
            .values()
            .filter(|p| p.status == STATUS_FINALIZADA)
            .filter_map(|p| {
                let docente = tables.usuarios.get(&p.docente_id)?;
                let unidad = tables.unidades.get(&p.unidad_academica_id)?;
                Some(PublicSearchItem {
                    id: p.id,
                    nombre_planeacion: p.nombre_planeacion.clone(),
                    unidad_aprendizaje: p.asignatura.clone().unwrap_or_default(),
                    profesor: docente.user.nombre_completo.clone(),
                    unidad_academica: unidad.nombre.clone(),
                    unidad_academica_abreviatura: unidad.abreviatura.clone().unwrap_or_default(),
                    updated_at: p.updated_at,
                    slug: p.slug.clone().unwrap_or_default(),
                })
            })
            .filter(|item| {
                filters.profesor.as_deref().map_or(true, |f| contains_ci(&item.profesor, f))
                    && filters.unidad.as_deref().map_or(true, |f| contains_ci(&item.unidad_aprendizaje, f))
                    && filters.ua.as_deref().map_or(true, |f| {
                        contains_ci(&item.unidad_academica, f) || contains_ci(&item.unidad_academica_abreviatura, f)
                    })
            })
            .collect();

        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(items
            .into_iter()
            .skip(filters.offset.max(0) as usize)
            .take(filters.limit.max(0) as usize)
            .collect())
    }

    async fn find_public_header(&self, lookup: &PublicLookup) -> StoreResult<Option<PublicPlaneacion>> {
        let tables = self.tables.read().await;
        let found = tables
            .planeaciones
            .values()
            .filter(|p| p.status == STATUS_FINALIZADA)
            .find(|p| match lookup {
                PublicLookup::Id(id) => p.id == *id,
                PublicLookup::Slug(slug) => p.slug.as_deref() == Some(slug.as_str()),
            });
        Ok(found.and_then(|p| tables.public_header(p)))
    }

    async fn list_referencias(&self, planeacion_id: i64) -> StoreResult<Vec<Referencia>> {
        let tables = self.tables.read().await;
        Ok(tables
            .referencias
            .iter()
            .filter(|(pid, _)| *pid == planeacion_id)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn list_unidades_tematicas(&self, planeacion_id: i64) -> StoreResult<Vec<UnidadTematicaRow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .unidades_tematicas
            .iter()
            .filter(|(pid, _)| *pid == planeacion_id)
            .map(|(_, u)| u.clone())
            .collect())
    }

    async fn list_sesiones(&self, unidad_ids: &[i64]) -> StoreResult<Vec<SesionDidacticaRow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sesiones
            .iter()
            .filter(|s| unidad_ids.contains(&s.unidad_tematica_id))
            .cloned()
            .collect())
    }

    async fn public_stats(&self) -> StoreResult<PublicStats> {
        if self.stall_stats.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let tables = self.tables.read().await;
        let finalizadas = tables
            .planeaciones
            .values()
            .filter(|p| p.status == STATUS_FINALIZADA);
        let mut docentes: Vec<i64> = tables.planeaciones.values().map(|p| p.docente_id).collect();
        docentes.sort_unstable();
        docentes.dedup();

        Ok(PublicStats {
            planeaciones_total: tables.planeaciones.len() as i64,
            planeaciones_finalizadas: finalizadas.clone().count() as i64,
            docentes_participantes: docentes.len() as i64,
            unidades_tematicas_total: tables.unidades_tematicas.len() as i64,
            sesiones_didacticas_total: tables.sesiones.len() as i64,
            ultima_actualizacion: tables.planeaciones.values().map(|p| p.updated_at).max(),
            ultima_publicacion: finalizadas.filter_map(|p| p.finalizada_at).max(),
        })
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query("connection refused".to_string()));
        }
        Ok(())
    }
}
