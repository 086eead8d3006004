pub mod collections;
pub mod links;
pub mod system;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    let api = Router::new()
        .merge(collections::routes())
        .merge(links::routes())
        .merge(system::api_routes())
        .fallback(system::api_not_found);

    Router::new().merge(system::routes()).nest("/api", api)
}
