//! History normalization and the byte relay between the provider stream and
//! the HTTP response body.

use bytes::Bytes;
use futures::StreamExt;
use log::{ error, info, warn };
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use super::errors::ApiError;
use crate::llm::LlmError;
use crate::llm::chat::TextStream;
use crate::models::chat::{ Role, Turn };

fn has_content(item: &Value) -> bool {
    item.get("content")
        .and_then(Value::as_str)
        .map(|c| !c.trim().is_empty())
        .unwrap_or(false)
}

/// Turns the posted JSON into the history forwarded upstream.
///
/// Blank entries are dropped first; then a leading assistant turn (the UI
/// greeting) is dropped so the provider always sees a user-initiated history.
pub fn normalize_history(payload: Value) -> Result<Vec<Turn>, ApiError> {
    let items = match payload {
        Value::Array(items) => items,
        _ => return Err(ApiError::InvalidPayload),
    };

    let mut history = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().filter(has_content).enumerate() {
        let turn: Turn = serde_json::from_value(item).map_err(|_| ApiError::InvalidPayload)?;
        if index == 0 && turn.role == Role::Assistant {
            continue;
        }
        history.push(turn);
    }

    if history.is_empty() {
        return Err(ApiError::EmptyHistory);
    }
    Ok(history)
}

pub fn build_upstream_messages(system_prompt: &str, history: Vec<Turn>) -> Vec<Turn> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Turn::system(system_prompt));
    messages.extend(history);
    messages
}

/// Forwards each text delta as soon as it arrives.
///
/// An upstream failure is passed on as the final item, which aborts the
/// response body. Dropping the returned stream stops the relay task at its
/// next send, which in turn drops the upstream response.
pub fn relay_stream(
    request_id: Uuid,
    mut upstream: TextStream
) -> ReceiverStream<Result<Bytes, LlmError>> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut chunks = 0usize;
        while let Some(item) = upstream.next().await {
            match item {
                Ok(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    if tx.send(Ok(Bytes::from(text))).await.is_err() {
                        warn!("[{}] Client went away after {} chunks, dropping upstream", request_id, chunks);
                        return;
                    }
                    chunks += 1;
                }
                Err(e) => {
                    error!("[{}] Upstream stream aborted after {} chunks: {}", request_id, chunks, e);
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }
        info!("[{}] Relay completed ({} chunks)", request_id, chunks);
    });

    ReceiverStream::new(rx)
}
