// Endpoints reachable without a token: token acquisition, the org-unit
// catalog and the read-only catalog of finalized planeaciones.
pub mod auth;
pub mod catalog;
pub mod unidades;
