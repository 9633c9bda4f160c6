// Endpoints behind `jwt_auth_middleware`; every handler reads the caller
// from the `AuthUser` extension.
pub mod me;
pub mod planeaciones;
