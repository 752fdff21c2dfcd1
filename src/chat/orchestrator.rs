//! The turn loop glue between input lines, the session, and the client.

use tokio_util::sync::CancellationToken;

use crate::chat::commands::{ChatCommand, help_text, parse_command};
use crate::chat::session::ChatSession;
use crate::client::CompletionClient;
use crate::observability::SESSION_EMPTY_REPLIES;
use crate::render::Renderer;

/// What the input loop should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Read the next line.
    Continue,
    /// Shut down.
    Quit,
}

/// How a single input line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line was empty or whitespace.
    Empty,
    /// The line was a control command.
    Command(ChatCommand),
    /// A reply arrived and the turn was added to the history.
    Committed,
    /// The call succeeded but produced no text; nothing was recorded.
    EmptyReply,
    /// The call failed; the message is what the user was shown.
    Failed(String),
    /// The user interrupted the reply.
    Interrupted,
}

impl LineOutcome {
    /// Whether the input loop should keep going.
    pub fn control(&self) -> LoopControl {
        match self {
            LineOutcome::Command(ChatCommand::Quit) => LoopControl::Quit,
            _ => LoopControl::Continue,
        }
    }
}

/// Routes input lines to commands or to chat turns.
///
/// Errors from the client never escape: they are shown through the renderer
/// and leave the history untouched.
pub struct Orchestrator<C: CompletionClient> {
    client: C,
    session: ChatSession,
    banner: Option<String>,
}

impl<C: CompletionClient> Orchestrator<C> {
    /// Creates a new orchestrator.
    pub fn new(client: C, session: ChatSession) -> Self {
        Self {
            client,
            session,
            banner: None,
        }
    }

    /// Sets the banner shown again after `/clear`.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    /// Returns the session.
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Returns the client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Handles one line of input.
    pub async fn handle_line(
        &mut self,
        line: &str,
        renderer: &mut dyn Renderer,
        cancel: &CancellationToken,
    ) -> LineOutcome {
        let input = line.trim();
        if input.is_empty() {
            renderer.print_warning("Please enter a message.");
            return LineOutcome::Empty;
        }

        if let Some(command) = parse_command(input) {
            self.run_command(command, renderer);
            return LineOutcome::Command(command);
        }

        self.run_turn(input, renderer, cancel).await
    }

    fn run_command(&mut self, command: ChatCommand, renderer: &mut dyn Renderer) {
        match command {
            ChatCommand::Help => renderer.print_info(help_text()),
            ChatCommand::Clear => {
                self.session.clear();
                renderer.clear_screen();
                if let Some(banner) = &self.banner {
                    renderer.print_info(banner);
                }
                renderer.print_success("Conversation history cleared.");
            }
            ChatCommand::Quit => {}
        }
    }

    async fn run_turn(
        &mut self,
        input: &str,
        renderer: &mut dyn Renderer,
        cancel: &CancellationToken,
    ) -> LineOutcome {
        let messages = self.session.build_messages(input);
        match self.client.complete(messages, renderer, cancel).await {
            Ok(reply) if reply.is_empty() => {
                SESSION_EMPTY_REPLIES.click();
                renderer.print_warning("The reply was empty; nothing was added to the history.");
                LineOutcome::EmptyReply
            }
            Ok(reply) => {
                self.session.commit_turn(input, &reply);
                LineOutcome::Committed
            }
            Err(err) if err.is_abort() => LineOutcome::Interrupted,
            Err(err) => {
                let message = format!("API request failed: {err}");
                renderer.print_error(&message);
                LineOutcome::Failed(message)
            }
        }
    }
}
