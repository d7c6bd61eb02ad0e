use axum::{
    Router,
    routing::{get, put},
};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route(
            "/addresses",
            get(handlers::get_addresses).post(handlers::create_address),
        )
        .route(
            "/addresses/{id}",
            put(handlers::update_address).delete(handlers::delete_address),
        )
}
