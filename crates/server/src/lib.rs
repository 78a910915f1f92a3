//! HTTP surface for the invite service.

use axum::{
    Router,
    routing::{delete, get, post},
};

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/invites",
            post(routes::invites::create_invite).get(routes::invites::list_invites),
        )
        .route("/v1/invites/{id}", delete(routes::invites::delete_invite))
        .route("/v1/join", post(routes::join::join))
        .route("/v1/join/{code}", get(routes::join::invite_preview))
        .with_state(state)
}
