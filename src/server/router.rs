use axum::{Router, routing::get};
use std::path::Path;
use tokio::sync::watch;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::db::sqlite::AdminStorage;
use crate::handlers::health::health_handler;
use crate::lifecycle::Phase;

#[derive(Clone)]
pub struct NotebookState {
    pub storage: AdminStorage,
    pub phase: watch::Receiver<Phase>,
}

impl NotebookState {
    pub fn new(storage: AdminStorage, phase: watch::Receiver<Phase>) -> Self {
        Self { storage, phase }
    }
}

pub fn notebook_router(state: NotebookState, upload_dir: &Path) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
