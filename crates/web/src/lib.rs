//! Web front end: the one-page send form and the JSON API behind it.
//!
//! [`build_app`] is shared by [`serve`] and the integration tests.

pub mod api;
pub mod error;
pub mod jobs;
pub mod templates;

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        routing::{get, post},
    },
    tracing::info,
    whatsend_config::UiConfig,
    whatsend_whatsapp::Sender,
};

use crate::jobs::JobRegistry;

#[derive(Clone)]
pub struct AppState {
    pub sender: Arc<Sender>,
    pub jobs: Arc<JobRegistry>,
    pub ui: Arc<UiConfig>,
    pub version: &'static str,
}

impl AppState {
    pub fn new(sender: Sender, ui: UiConfig, job_history: usize) -> Self {
        Self {
            sender: Arc::new(sender),
            jobs: Arc::new(JobRegistry::new(job_history)),
            ui: Arc::new(ui),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::index_handler))
        .route("/health", get(api::health_handler))
        .route("/api/send", post(api::send_handler))
        .route("/api/jobs/{id}", get(api::job_handler))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(bind: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
