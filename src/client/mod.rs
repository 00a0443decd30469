//! Rust rendition of the chat page's state machine, driving the relay over
//! HTTP (or any [`RelayTransport`]).

pub mod conversation;
pub mod decoder;
pub mod session;
pub mod transport;

pub use conversation::{ Conversation, GREETING };
pub use session::{ ChatSession, SubmitOutcome };
pub use transport::{ ClientError, HttpRelay, RelayResponse, RelayTransport };
