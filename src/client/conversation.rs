use serde::Serialize;

use crate::models::chat::{ Role, Turn };

pub const GREETING: &str = "Hello! I'm your one stop shop for soccer. How can I help you today?";

/// Ordered turns of one chat session.
///
/// Every operation returns a new value; the session publishes each one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::from_turns(vec![Turn::assistant(GREETING)])
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn with_turn(&self, turn: Turn) -> Self {
        let mut turns = self.turns.clone();
        turns.push(turn);
        Self { turns }
    }

    /// Appends `text` to the last turn if it is an assistant turn; otherwise
    /// returns an unchanged copy.
    pub fn append_to_last_assistant(&self, text: &str) -> Self {
        match self.turns.split_last() {
            Some((last, rest)) if last.role == Role::Assistant => {
                let mut turns = rest.to_vec();
                turns.push(Turn::assistant(format!("{}{}", last.content, text)));
                Self { turns }
            }
            _ => self.clone(),
        }
    }

    /// Replaces the last turn's content if it is an assistant turn, otherwise
    /// appends a new assistant turn carrying `content`.
    pub fn set_last_assistant(&self, content: &str) -> Self {
        match self.turns.split_last() {
            Some((last, rest)) if last.role == Role::Assistant => {
                let mut turns = rest.to_vec();
                turns.push(Turn::assistant(content));
                Self { turns }
            }
            _ => self.with_turn(Turn::assistant(content)),
        }
    }
}
