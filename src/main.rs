// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use anyhow::Context;
use axum::{routing::{get, post}, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_builder::build_dashboard;
use crate::application::panel_runner::PanelRunner;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::elasticsearch::ElasticsearchClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_dashboard, get_pageload_panel, health_check, refresh_pageload_panel,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Search backend (infrastructure layer)
    let client = Arc::new(ElasticsearchClient::new(config.elasticsearch.host));

    // Dashboard and its pageload panel (application layer)
    let dashboard = build_dashboard(&config.dashboard);
    let runner = Arc::new(PanelRunner::new(dashboard, client, config.panel.overlap_policy)?);

    // Log every render request
    let mut renders = runner.subscribe();
    tokio::spawn(async move {
        while renders.changed().await.is_ok() {
            if let Some(stats) = renders.borrow_and_update().as_ref() {
                tracing::info!("Rendered {} page rows, overall value {:?}", stats.rows.len(), stats.value);
            }
        }
    });

    // Periodic refresh signal; the first tick fires immediately
    let ticker = runner.clone();
    let period = Duration::from_secs(config.panel.refresh_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            tracing::info!("Refreshing pageload panel");
            let refresh = ticker.refresh();
            tokio::spawn(async move {
                if let Err(e) = refresh.await {
                    if e.is_panic() {
                        tracing::error!("Pageload refresh panicked: {}", e);
                    }
                }
            });
        }
    });

    let state = Arc::new(AppState { runner });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards/:name", get(get_dashboard))
        .route("/panels/pageload", get(get_pageload_panel))
        .route("/panels/pageload/refresh", post(refresh_pageload_panel))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.server.listen))?;
    tracing::info!("Starting pageload-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
