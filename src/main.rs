mod auth;
mod cart;
mod order;
mod pool;
mod product;
mod user;
mod utils;

use axum::Router;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use listenfd::ListenFd;
use std::env;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    {
        let mut conn =
            shalura::establish_connection().expect("failed to connect for migrations");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("failed to run migrations");
    }

    let pool = pool::get_pool().await.expect("failed to create db pool");

    let routes = Router::new()
        .merge(auth::routes::get_routes())
        .merge(user::routes::get_routes())
        .merge(product::routes::get_routes())
        .merge(cart::routes::get_routes())
        .merge(order::routes::get_routes());

    let app = Router::new()
        .nest("/api/v1", routes)
        .with_state(pool)
        .fallback(utils::handler_404)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_owned());
    let mut listenfd = ListenFd::from_env();
    // reuse the listener across auto-reload restarts when one is handed down
    let listener = match listenfd.take_tcp_listener(0).unwrap() {
        Some(listener) => {
            listener.set_nonblocking(true).unwrap();
            TcpListener::from_std(listener).unwrap()
        }
        None => TcpListener::bind(format!("127.0.0.1:{}", port)).await.unwrap(),
    };
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}
