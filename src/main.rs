//! Cartwheel - shopping-cart pricing service

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cartwheel::catalog::{Catalog, InMemoryCatalog, PgCatalog};
use cartwheel::repository::{CartRepository, InMemoryCartRepository, PgCartRepository};
use cartwheel::service::CartService;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (catalog, carts): (Arc<dyn Catalog>, Arc<dyn CartRepository>) =
        match std::env::var("DATABASE_URL") {
            Ok(url) => {
                let db = PgPoolOptions::new().max_connections(10).connect(&url).await?;
                sqlx::migrate!("./migrations").run(&db).await?;
                tracing::info!("using postgres storage");
                (Arc::new(PgCatalog::new(db.clone())), Arc::new(PgCartRepository::new(db)))
            }
            Err(_) => {
                tracing::info!("DATABASE_URL not set; using in-memory storage with the demo catalog");
                (
                    Arc::new(InMemoryCatalog::with_default_products()),
                    Arc::new(InMemoryCartRepository::new()),
                )
            }
        };

    let app = cartwheel::api::app(CartService::new(catalog, carts));

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("cartwheel listening on 0.0.0.0:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
