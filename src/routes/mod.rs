pub mod health;
pub mod mcp;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Every route this server answers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest_service("/mcp", mcp::service(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
