//! Router assembly.

use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{auth, cache, error, pages};

/// Builds the application router.
///
/// Layer order, outermost first: error handling, tracing, then the page
/// cache on the page routes only.
pub fn router(state: AppState) -> Router {
    let mut page_routes = Router::new()
        .route("/home", get(pages::home))
        .route("/home.json", get(pages::home_json))
        .route("/playlists", get(pages::playlists))
        .route("/playlists.json", get(pages::playlists_json))
        .route("/playlists/{id}", get(pages::playlist));
    if let Some(page_cache) = state.page_cache.clone() {
        page_routes =
            page_routes.route_layer(middleware::from_fn_with_state(page_cache, cache::cache_pages));
    }

    Router::new()
        .route("/", get(pages::root))
        .route("/login", get(auth::login))
        .route("/auth_redir", get(auth::auth_redirect))
        .route("/logout", get(auth::logout))
        .merge(page_routes)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(error::handle_errors))
        .with_state(state)
}
