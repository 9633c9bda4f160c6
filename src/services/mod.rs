pub mod catalog_service;
pub mod identity_service;
pub mod planeacion_service;
pub mod slug;

pub use catalog_service::{CatalogError, CatalogService, SearchPage, SearchParams};
pub use identity_service::{AuthSession, IdentityError, IdentityService};
pub use planeacion_service::{PlaneacionError, PlaneacionService};
