use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod content_loader;
mod hot_reload;
mod markdown;
mod models;
mod render;
mod routes;
mod state;

use config::SiteConfig;
use state::{AppState, RouterState};

#[tokio::main]
async fn main() {
    let is_development = std::env::var("RUST_ENV")
        .map(|v| v == "development")
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SiteConfig::load("site.toml").expect("Failed to load site.toml");
    info!(site = %config.title, development = is_development, "starting");

    let content = content_loader::load_content()
        .await
        .expect("Failed to load initial content files");
    info!(posts = content.posts.len(), pages = content.pages.len(), "content loaded");

    let state = Arc::new(AppState::new(config, content, is_development));

    let (tx, _rx) = broadcast::channel(1);
    if is_development {
        info!("Hot reload enabled. Check logs for file change events.");
        hot_reload::start_content_watcher(tx.clone(), state.clone());
    }

    let app = routes::build_router(RouterState {
        app_state: state,
        broadcaster: tx,
    });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "listening");
    let listener = TcpListener::bind(addr).await.expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}
