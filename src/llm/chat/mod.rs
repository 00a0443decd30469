pub mod openai;
pub mod sse;

use async_trait::async_trait;
use futures::{ Future, Stream };
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ LlmConfig, LlmError };
use self::openai::OpenAIChatClient;
use crate::models::chat::Turn;

pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Starts a streamed completion over `messages`.
    ///
    /// Setup failures (connection, non-success status) are returned here;
    /// failures after the first byte arrive as `Err` items on the stream.
    async fn stream_chat(&self, messages: &[Turn]) -> Result<TextStream, LlmError>;

    fn model(&self) -> &str;
}

/// Runs `response_fn` on its own task, exposing what it sends as a stream.
///
/// Once the returned stream is dropped, sends from the task fail, which the
/// producer treats as a signal to stop.
pub fn create_streaming_response<F, Fut>(response_fn: F) -> TextStream
    where
        F: FnOnce(mpsc::Sender<Result<String, LlmError>>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static
{
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        response_fn(tx).await;
    });

    Box::pin(ReceiverStream::new(rx))
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = OpenAIChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
