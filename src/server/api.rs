use std::sync::Arc;

use axum::{
    Router,
    body::{ Body, Bytes },
    extract::State,
    http::header::{ CACHE_CONTROL, CONTENT_TYPE },
    response::{ Html, IntoResponse, Response },
    routing::{ get, post },
};
use log::info;
use tower_http::cors::{ Any, CorsLayer };
use uuid::Uuid;

use super::errors::ApiError;
use super::relay::{ build_upstream_messages, normalize_history, relay_stream };
use crate::llm::chat::ChatClient;

pub const CHAT_ROUTE: &str = "/api/chat";

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub chat_client: Arc<dyn ChatClient>,
    pub system_prompt: Arc<str>,
}

impl AppState {
    pub fn new(chat_client: Arc<dyn ChatClient>, system_prompt: impl Into<Arc<str>>) -> Self {
        Self {
            chat_client,
            system_prompt: system_prompt.into(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route(CHAT_ROUTE, post(chat_handler))
        .layer(cors)
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();

    let payload: serde_json::Value = serde_json::from_slice(&body)?;
    let history = normalize_history(payload)?;
    info!(
        "[{}] Relaying {} turns to model {}",
        request_id,
        history.len(),
        state.chat_client.model()
    );

    let messages = build_upstream_messages(&state.system_prompt, history);
    let upstream = state.chat_client.stream_chat(&messages).await?;

    let headers = [
        (CONTENT_TYPE, "text/plain; charset=utf-8"),
        (CACHE_CONTROL, "no-cache, no-transform"),
    ];
    Ok((headers, Body::from_stream(relay_stream(request_id, upstream))).into_response())
}
