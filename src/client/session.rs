use futures::StreamExt;
use log::{ debug, warn };
use std::sync::atomic::{ AtomicBool, Ordering };
use tokio::sync::watch;

use super::conversation::Conversation;
use super::decoder::Utf8ChunkDecoder;
use super::transport::{ ByteStream, RelayResponse, RelayTransport };
use crate::models::chat::Turn;

pub const EMPTY_RESPONSE_MESSAGE: &str = "I'm sorry, I couldn't generate a response. Please try again.";
pub const TRANSPORT_ERROR_MESSAGE: &str =
    "I'm sorry, but I encountered an error. Please try again later.";
pub const REJECTED_FALLBACK_MESSAGE: &str = "Network response was not ok";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or another submission was still in flight.
    Ignored,
    Streamed {
        received_text: bool,
    },
    Rejected {
        status: u16,
    },
    Failed,
}

struct SendingGuard<'a>(&'a AtomicBool);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client-side chat state: the conversation plus the in-flight flag.
///
/// Every state change is published on a watch channel so a view can
/// re-render and scroll to the newest turn.
pub struct ChatSession<T> {
    transport: T,
    state: watch::Sender<Conversation>,
    sending: AtomicBool,
}

impl<T: RelayTransport> ChatSession<T> {
    pub fn new(transport: T) -> Self {
        Self::with_conversation(transport, Conversation::new())
    }

    pub fn with_conversation(transport: T, conversation: Conversation) -> Self {
        let (state, _) = watch::channel(conversation);
        Self {
            transport,
            state,
            sending: AtomicBool::new(false),
        }
    }

    pub fn conversation(&self) -> Conversation {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Conversation> {
        self.state.subscribe()
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn update(&self, transition: impl FnOnce(&Conversation) -> Conversation) {
        self.state.send_modify(|conversation| {
            *conversation = transition(conversation);
        });
    }

    /// Sends `text` and streams the reply into the conversation.
    ///
    /// The in-flight flag is cleared when this returns or when the future is
    /// dropped early.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.sending.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            debug!("Submission ignored, another one is still in flight");
            return SubmitOutcome::Ignored;
        }
        let _guard = SendingGuard(&self.sending);

        let history = self.conversation().with_turn(Turn::user(message));
        self.state.send_replace(history.with_turn(Turn::assistant("")));

        match self.transport.post_history(history.turns()).await {
            Ok(RelayResponse::Rejected { status, body }) => {
                let message = rejection_message(&body);
                warn!("Relay rejected submission with status {}: {}", status, message);
                self.update(|c| c.set_last_assistant(&message));
                SubmitOutcome::Rejected { status }
            }
            Ok(RelayResponse::Streaming(stream)) => self.consume(stream).await,
            Err(e) => {
                warn!("Relay request failed: {}", e);
                self.update(|c| c.set_last_assistant(TRANSPORT_ERROR_MESSAGE));
                SubmitOutcome::Failed
            }
        }
    }

    async fn consume(&self, mut stream: ByteStream) -> SubmitOutcome {
        let mut decoder = Utf8ChunkDecoder::new();
        let mut received_text = false;

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    let text = decoder.decode(&bytes);
                    if !text.is_empty() {
                        received_text = true;
                        self.update(|c| c.append_to_last_assistant(&text));
                    }
                }
                Err(e) => {
                    warn!("Relay stream broke off: {}", e);
                    // keep whatever partial reply already arrived
                    if !received_text {
                        self.update(|c| c.set_last_assistant(TRANSPORT_ERROR_MESSAGE));
                    }
                    return SubmitOutcome::Failed;
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            received_text = true;
            self.update(|c| c.append_to_last_assistant(&tail));
        }
        if !received_text {
            self.update(|c| c.set_last_assistant(EMPTY_RESPONSE_MESSAGE));
        }
        SubmitOutcome::Streamed { received_text }
    }
}

fn rejection_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| REJECTED_FALLBACK_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::conversation::GREETING;
    use crate::client::transport::ClientError;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::{ stream, FutureExt };
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone)]
    enum Script {
        Chunks(Vec<&'static [u8]>),
        Rejected(u16, &'static str),
        Unreachable,
        BreakAfter(Vec<&'static [u8]>),
    }

    struct MockTransport {
        script: Script,
        calls: AtomicUsize,
        posted: Mutex<Vec<Vec<Turn>>>,
    }

    impl MockTransport {
        fn new(script: Script) -> Self {
            Self { script, calls: AtomicUsize::new(0), posted: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn parts(texts: &[&'static str]) -> Vec<&'static [u8]> {
        texts.iter().map(|t| t.as_bytes()).collect()
    }

    fn chunk_stream(chunks: Vec<&'static [u8]>, fail_at_end: bool) -> ByteStream {
        let mut items: Vec<Result<Bytes, ClientError>> = chunks
            .into_iter()
            .map(|c| Ok(Bytes::from_static(c)))
            .collect();
        if fail_at_end {
            items.push(Err(ClientError::Stream("connection reset".into())));
        }
        Box::pin(stream::iter(items))
    }

    #[async_trait]
    impl RelayTransport for MockTransport {
        async fn post_history(&self, history: &[Turn]) -> Result<RelayResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.posted.lock().unwrap().push(history.to_vec());
            tokio::task::yield_now().await;

            match self.script.clone() {
                Script::Chunks(chunks) => Ok(RelayResponse::Streaming(chunk_stream(chunks, false))),
                Script::BreakAfter(chunks) => Ok(RelayResponse::Streaming(chunk_stream(chunks, true))),
                Script::Rejected(status, body) => Ok(RelayResponse::Rejected {
                    status,
                    body: Bytes::from_static(body.as_bytes()),
                }),
                Script::Unreachable => Err(ClientError::Stream("connection refused".into())),
            }
        }
    }

    fn session(script: Script) -> ChatSession<MockTransport> {
        ChatSession::new(MockTransport::new(script))
    }

    fn last_content(session: &ChatSession<MockTransport>) -> String {
        session.conversation().last().unwrap().content.clone()
    }

    #[tokio::test]
    async fn streamed_chunks_fill_placeholder() {
        let session = session(Script::Chunks(parts(&["Hel", "lo"])));
        let outcome = session.submit("  Who won the 2014 World Cup?  ").await;

        assert_eq!(outcome, SubmitOutcome::Streamed { received_text: true });
        assert_eq!(
            session.conversation().turns(),
            &[
                Turn::assistant(GREETING),
                Turn::user("Who won the 2014 World Cup?"),
                Turn::assistant("Hello"),
            ]
        );
        assert!(!session.is_sending());
    }

    #[tokio::test]
    async fn posts_prior_history_without_placeholder() {
        let session = session(Script::Chunks(parts(&["ok"])));
        session.submit("hi").await;

        let posted = session.transport().posted.lock().unwrap().clone();
        assert_eq!(posted, vec![vec![Turn::assistant(GREETING), Turn::user("hi")]]);
    }

    #[tokio::test]
    async fn empty_stream_uses_fallback() {
        let session = session(Script::Chunks(vec![]));
        let outcome = session.submit("hi").await;

        assert_eq!(outcome, SubmitOutcome::Streamed { received_text: false });
        assert_eq!(last_content(&session), EMPTY_RESPONSE_MESSAGE);
    }

    #[tokio::test]
    async fn rejection_shows_server_error() {
        let session = session(Script::Rejected(500, r#"{"error":"bad key"}"#));
        let outcome = session.submit("hi").await;

        assert_eq!(outcome, SubmitOutcome::Rejected { status: 500 });
        assert_eq!(last_content(&session), "bad key");
        assert_eq!(session.conversation().len(), 3);
    }

    #[tokio::test]
    async fn rejection_with_unreadable_body_uses_fallback() {
        let session = session(Script::Rejected(502, "<html>Bad Gateway</html>"));
        session.submit("hi").await;
        assert_eq!(last_content(&session), REJECTED_FALLBACK_MESSAGE);

        let session = self::session(Script::Rejected(400, r#"{"error":""}"#));
        session.submit("hi").await;
        assert_eq!(last_content(&session), REJECTED_FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let session = session(Script::Chunks(parts(&["unused"])));

        assert_eq!(session.submit("").await, SubmitOutcome::Ignored);
        assert_eq!(session.submit(" \n\t ").await, SubmitOutcome::Ignored);
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.transport().calls(), 0);
    }

    #[tokio::test]
    async fn overlapping_submit_is_ignored() {
        let session = session(Script::Chunks(parts(&["Hello"])));

        let (first, second) = tokio::join!(session.submit("first"), session.submit("second"));

        assert_eq!(first, SubmitOutcome::Streamed { received_text: true });
        assert_eq!(second, SubmitOutcome::Ignored);
        assert_eq!(session.transport().calls(), 1);
        assert_eq!(session.conversation().len(), 3);
        assert_eq!(session.conversation().turns()[1], Turn::user("first"));
    }

    #[tokio::test]
    async fn transport_failure_shows_generic_error_and_recovers() {
        let session = session(Script::Unreachable);

        assert_eq!(session.submit("hi").await, SubmitOutcome::Failed);
        assert_eq!(last_content(&session), TRANSPORT_ERROR_MESSAGE);
        assert!(!session.is_sending());

        session.submit("again").await;
        assert_eq!(session.transport().calls(), 2);
        assert_eq!(session.conversation().len(), 5);
    }

    #[tokio::test]
    async fn broken_stream_keeps_partial_reply() {
        let session = session(Script::BreakAfter(parts(&["Pel", "e"])));
        assert_eq!(session.submit("best ever?").await, SubmitOutcome::Failed);
        assert_eq!(last_content(&session), "Pele");
    }

    #[tokio::test]
    async fn broken_stream_before_text_shows_generic_error() {
        let session = session(Script::BreakAfter(vec![]));
        session.submit("hi").await;
        assert_eq!(last_content(&session), TRANSPORT_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn multibyte_text_split_across_chunks() {
        let session = session(Script::Chunks(vec![&b"Ol\xc3"[..], &b"\xa9!"[..]]));
        session.submit("cheer").await;
        assert_eq!(last_content(&session), "Olé!");
    }

    #[tokio::test]
    async fn subscribers_see_every_change() {
        let session = session(Script::Chunks(parts(&["Hel", "lo"])));
        let mut rx = session.subscribe();
        assert!(!rx.has_changed().unwrap());

        session.submit("hi").await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().last(), Some(&Turn::assistant("Hello")));
    }

    #[tokio::test]
    async fn dropped_submission_clears_in_flight_flag() {
        let session = session(Script::Chunks(parts(&["never read"])));

        assert!(session.submit("hi").now_or_never().is_none());

        assert!(!session.is_sending());
        assert_eq!(session.conversation().len(), 3);
        assert_eq!(last_content(&session), "");
    }
}
