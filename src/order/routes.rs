use axum::{
    Router,
    routing::{get, put},
};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route(
            "/orders",
            get(handlers::get_orders).post(handlers::create_order),
        )
        .route("/orders/{id}", get(handlers::get_order))
        .route("/orders/{id}/cancel", put(handlers::cancel_order))
}
