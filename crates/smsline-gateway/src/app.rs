use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use smsline_core::config::SmslineConfig;
use smsline_store::MessageStore;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state handed to every Axum handler as `Arc<AppState>`.
pub struct AppState {
    pub config: SmslineConfig,
    /// The one message store for this process, created at startup.
    pub store: Arc<MessageStore>,
}

impl AppState {
    pub fn new(config: SmslineConfig, store: Arc<MessageStore>) -> Self {
        Self { config, store }
    }

    /// State with a fresh store sized from `config.store.capacity`.
    pub fn from_config(config: SmslineConfig) -> Self {
        let store = Arc::new(MessageStore::new(config.store.capacity));
        Self::new(config, store)
    }
}

/// Assemble the full Axum router.
///
/// The `/api/...` paths are kept as aliases so an SMS number already pointed
/// at the site's API routes keeps working.
pub fn build_router(state: Arc<AppState>) -> Router {
    // the page embedding the toast listener is usually served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/webhook", post(crate::http::webhook::webhook_handler))
        .route(
            "/api/twilio/webhook",
            post(crate::http::webhook::webhook_handler),
        )
        .route("/stream", get(crate::http::stream::stream_handler))
        .route(
            "/api/messages/stream",
            get(crate::http::stream::stream_handler),
        )
        .with_state(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
