use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::sse::{ ErrorBody, SseDecoder, SseEvent };
use super::{ create_streaming_response, ChatClient, TextStream };
use crate::llm::{ LlmConfig, LlmError };
use crate::models::chat::Turn;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIErrorResponse {
    error: ErrorBody,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: &str,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
            LlmError::InvalidApiKey(e.to_string())
        )?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(&config.api_key, config.completion_model.clone(), config.base_url.clone())
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }
}

/// Pulls the human-readable message out of a provider error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<OpenAIErrorResponse>(body)
        .ok()
        .and_then(|r| r.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn stream_chat(&self, messages: &[Turn]) -> Result<TextStream, LlmError> {
        let url = self.completions_url();
        let req = OpenAIChatRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        let resp = self.http.post(&url).json(&req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let mut message = error_message(&body);
            if message.is_empty() {
                message = status.canonical_reason().unwrap_or("Upstream request failed").to_string();
            }
            return Err(LlmError::Status { status: status.as_u16(), message });
        }

        let mut bytes = Box::pin(resp.bytes_stream());

        Ok(
            create_streaming_response(move |tx| async move {
                let mut decoder = SseDecoder::new();

                while let Some(chunk_result) = bytes.next().await {
                    let chunk = match chunk_result {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            let _ = tx.send(Err(LlmError::Http(e))).await;
                            return;
                        }
                    };

                    for event in decoder.push(&chunk) {
                        match event {
                            SseEvent::Delta(content) => {
                                if tx.send(Ok(content)).await.is_err() {
                                    debug!("Stream receiver dropped, abandoning upstream response");
                                    return;
                                }
                            }
                            SseEvent::Error(message) => {
                                let _ = tx.send(Err(LlmError::Stream(message))).await;
                                return;
                            }
                            SseEvent::Done => {
                                return;
                            }
                        }
                    }
                }

                match decoder.finish() {
                    Some(SseEvent::Delta(content)) => {
                        let _ = tx.send(Ok(content)).await;
                    }
                    Some(SseEvent::Error(message)) => {
                        let _ = tx.send(Err(LlmError::Stream(message))).await;
                    }
                    Some(SseEvent::Done) | None => {}
                }
            })
        )
    }

    fn model(&self) -> &str {
        &self.model
    }
}
