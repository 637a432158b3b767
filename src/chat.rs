//! Conversation controller: session history and the turn cycle.

use std::fmt;
use std::io::{self, BufRead, Write};

use tracing::{error, info};

use crate::pipeline::RagPipeline;
use crate::ui::{Notifier, TerminalUi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    Responding,
}

/// Append-only transcript of one interactive session.
#[derive(Debug, Default)]
pub struct Session {
    messages: Vec<ChatMessage>,
    state: TurnState,
}

impl Session {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    fn push(&mut self, message: ChatMessage, notifier: &dyn Notifier) {
        notifier.message(&message);
        self.messages.push(message);
    }
}

/// Runs one question through the pipeline. The session always gains
/// exactly two messages; a failure becomes the assistant's reply.
pub async fn process_turn(
    mut session: Session,
    input: &str,
    pipeline: &RagPipeline,
    notifier: &dyn Notifier,
) -> Session {
    session.push(ChatMessage::user(input), notifier);
    session.state = TurnState::Responding;

    let spinner = notifier.spinner("Searching for and creating answers...");
    let result = pipeline.invoke(input).await;
    spinner.finish_and_clear();

    let reply = match result {
        Ok(answer) => answer,
        Err(e) => {
            error!("Turn failed: {}", e);
            let message = format!("An error occurred while generating the answer: {e}");
            notifier.error(&message);
            message
        }
    };

    session.push(ChatMessage::assistant(reply), notifier);
    session.state = TurnState::Idle;
    session
}

/// Interactive loop over stdin until EOF.
pub async fn run(pipeline: &RagPipeline, ui: &TerminalUi) -> io::Result<Session> {
    let stdin = io::stdin();
    let mut session = Session::default();

    loop {
        print!("{}", ui.input_prompt());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF (Ctrl+D)
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        session = process_turn(session, input, pipeline, ui).await;
        debug_assert_eq!(session.state(), TurnState::Idle);
    }

    info!("Session ended after {} messages", session.messages().len());
    Ok(session)
}
