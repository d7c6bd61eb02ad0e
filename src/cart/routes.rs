use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route("/cart", get(handlers::get_cart))
        .route("/cart/items", post(handlers::add_to_cart))
        .route(
            "/cart/items/{id}",
            put(handlers::update_cart_item).delete(handlers::remove_cart_item),
        )
        .route("/cart/clear", delete(handlers::clear_cart))
}
