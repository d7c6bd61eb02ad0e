use axum::{
    Router,
    routing::{get, post, put},
};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", get(handlers::logout))
        .route("/auth/me", get(handlers::me))
        .route("/auth/profile", put(handlers::update_profile))
}
