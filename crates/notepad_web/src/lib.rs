//! HTTP surface of the online notepad.
//!
//! Pages are server-rendered; mutations go through `/actions/*`, which
//! answer with the shared action envelope.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::ActionError;
pub use state::{AppState, SharedBlobStore, Workspace};

use axum::Router;

/// Builds the full application router over `state`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::pages::router())
        .merge(routes::uploads::router())
        .nest(
            "/actions",
            routes::actions::router().merge(routes::events::router()),
        )
        .with_state(state)
}
