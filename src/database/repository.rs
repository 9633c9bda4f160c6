use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::{
    DatosGenerales, DatosGeneralesRow, NewUser, Planeacion, PlaneacionPatch, PlaneacionSummary, PublicLookup,
    PublicPlaneacion, PublicSearchItem, PublicStats, Referencia, SearchFilters, SesionDidacticaRow,
    UnidadAcademica, UnidadTematicaRow, User, UserCredentials,
};

pub type StoreResult<T> = Result<T, DatabaseError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Exact-match lookup; email comparison is case sensitive.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>>;

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Inserts with role `profesor` and `is_active = true`. A duplicate email
    /// fails with `DatabaseError::UniqueViolation`.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
}

#[async_trait]
pub trait UnidadRepository: Send + Sync {
    async fn list_unidades(&self, query: Option<&str>) -> StoreResult<Vec<UnidadAcademica>>;

    async fn find_unidad(&self, id: i64) -> StoreResult<Option<UnidadAcademica>>;

    async fn unidad_exists(&self, id: i64) -> StoreResult<bool>;
}

/// Every method that touches a document takes the owner id and filters on
/// `(id, docente_id)`.
#[async_trait]
pub trait PlaneacionRepository: Send + Sync {
    async fn list_planeaciones(&self, owner_id: i64) -> StoreResult<Vec<PlaneacionSummary>>;

    async fn insert_planeacion(&self, owner_id: i64, unidad_id: i64, nombre: &str) -> StoreResult<i64>;

    async fn find_planeacion(&self, id: i64, owner_id: i64) -> StoreResult<Option<Planeacion>>;

    /// Returns false when no owned row matched.
    async fn update_planeacion(&self, id: i64, owner_id: i64, patch: &PlaneacionPatch) -> StoreResult<bool>;

    /// Returns false when no owned row matched.
    async fn delete_planeacion(&self, id: i64, owner_id: i64) -> StoreResult<bool>;

    async fn find_datos_generales(&self, planeacion_id: i64) -> StoreResult<Option<DatosGeneralesRow>>;

    /// Writes the subject onto the document and upserts the single general
    /// data row in one transaction.
    async fn upsert_datos_generales(
        &self,
        planeacion_id: i64,
        asignatura: Option<&str>,
        datos: &DatosGenerales,
    ) -> StoreResult<()>;
}

/// Read side of the public catalog. Only finalized documents are visible.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn search_public(&self, filters: &SearchFilters) -> StoreResult<Vec<PublicSearchItem>>;

    /// Header row with general data, relations, organization and plagiarism
    /// columns; child collections are left empty.
    async fn find_public_header(&self, lookup: &PublicLookup) -> StoreResult<Option<PublicPlaneacion>>;

    async fn list_referencias(&self, planeacion_id: i64) -> StoreResult<Vec<Referencia>>;

    async fn list_unidades_tematicas(&self, planeacion_id: i64) -> StoreResult<Vec<UnidadTematicaRow>>;

    async fn list_sesiones(&self, unidad_ids: &[i64]) -> StoreResult<Vec<SesionDidacticaRow>>;

    async fn public_stats(&self) -> StoreResult<PublicStats>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

/// Everything the HTTP layer needs from persistence.
pub trait Store: UserRepository + UnidadRepository + PlaneacionRepository + CatalogRepository + HealthCheck {}

impl<T> Store for T where T: UserRepository + UnidadRepository + PlaneacionRepository + CatalogRepository + HealthCheck {}
