use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UnidadAcademica {
    pub id: i64,
    pub nombre: String,
    pub abreviatura: Option<String>,
}
