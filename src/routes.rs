use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{health, protected, public};
use crate::middleware::auth::{jwt_auth_middleware, session_auth_middleware};
use crate::state::AppState;

/// Full application router: `/health` at the root, everything else under `/api`.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(cors_layer(&state.config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{auth, catalog, unidades};

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/google", post(auth::google))
        .route("/unidades", get(unidades::list))
        .route("/unidades/:id", get(unidades::get))
        .route("/public/planeaciones", get(catalog::search))
        .route("/public/planeaciones/slug/:slug", get(catalog::get_by_slug))
        .route("/public/planeaciones/:id", get(catalog::get_by_id))
        .route("/public/stats", get(catalog::stats))
}

/// `/me` also honors the auth cookie; document routes take bearer tokens only.
fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{me, planeaciones};

    let session = Router::new()
        .route("/me", get(me::me))
        .route_layer(from_fn_with_state(state.clone(), session_auth_middleware));

    let documents = Router::new()
        .route("/planeaciones", get(planeaciones::list).post(planeaciones::create))
        .route(
            "/planeaciones/:id",
            get(planeaciones::get)
                .put(planeaciones::update)
                .delete(planeaciones::delete),
        )
        .route(
            "/planeaciones/:id/datos-generales",
            get(planeaciones::get_datos_generales).put(planeaciones::put_datos_generales),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware));

    session.merge(documents)
}

/// Credentialed CORS needs an explicit origin list; unparseable entries are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(12 * 60 * 60))
}
