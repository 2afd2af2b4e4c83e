// src/routes/mod.rs
pub mod chat;

use crate::state::SharedState;
use axum::{Router, extract::Request, routing::post};
use chat::chat_handler;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
            )
        }))
        .layer(CorsLayer::very_permissive())
}
