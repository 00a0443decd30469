use async_trait::async_trait;
use bytes::Bytes;
use futures::{ Stream, StreamExt };
use reqwest::Client as HttpClient;
use std::pin::Pin;
use thiserror::Error;

use crate::models::chat::Turn;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Relay request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The response body broke off after the status line.
    #[error("Relay stream failed: {0}")]
    Stream(String),
}

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

pub enum RelayResponse {
    /// Non-success status with whatever body came with it.
    Rejected {
        status: u16,
        body: Bytes,
    },
    Streaming(ByteStream),
}

/// How a chat session reaches the relay endpoint.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn post_history(&self, history: &[Turn]) -> Result<RelayResponse, ClientError>;
}

pub struct HttpRelay {
    http: HttpClient,
    url: String,
}

impl HttpRelay {
    /// `url` is the full address of the relay route, e.g. `http://127.0.0.1:3000/api/chat`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl RelayTransport for HttpRelay {
    async fn post_history(&self, history: &[Turn]) -> Result<RelayResponse, ClientError> {
        let resp = self.http.post(&self.url).json(history).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return Ok(RelayResponse::Rejected { status: status.as_u16(), body });
        }

        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ClientError::Stream(e.to_string())));
        Ok(RelayResponse::Streaming(Box::pin(stream)))
    }
}
