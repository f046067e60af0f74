use axum::{routing::get, Router};

pub mod expenses;
pub mod participants;
pub mod settlement;
pub mod system;

/// Router for all authenticated endpoints. Every settlement route is scoped to one event.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(participants::router())
        .merge(expenses::router())
        .merge(settlement::router())
}
