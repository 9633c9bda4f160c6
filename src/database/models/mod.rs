pub mod catalog;
pub mod planeacion;
pub mod unidad;
pub mod user;

pub use catalog::*;
pub use planeacion::*;
pub use unidad::UnidadAcademica;
pub use user::{NewUser, User, UserCredentials, ROLE_PROFESOR};
