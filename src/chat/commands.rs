//! Slash command parsing for the chat application.
//!
//! This module handles the few commands that start with `/` and control the
//! session without sending anything to the API. Any other input, including
//! unrecognized `/words`, is a chat message.

/// A parsed chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Clear the conversation history.
    Clear,

    /// Exit the chat application.
    Quit,
}

/// Parses user input for slash commands, ignoring case and surrounding space.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use deepchat::chat::{parse_command, ChatCommand};
/// assert_eq!(parse_command("/QUIT"), Some(ChatCommand::Quit));
/// assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
/// assert!(parse_command("Hello!").is_none());
/// assert!(parse_command("/model deepseek-chat").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    match input.trim().to_lowercase().as_str() {
        "/help" => Some(ChatCommand::Help),
        "/clear" => Some(ChatCommand::Clear),
        "/quit" | "/exit" => Some(ChatCommand::Quit),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Usage:
  Type a question and press Enter; the reply streams in as it is written.
  The last 10 exchanges are sent along as context.

Commands:
  /help     Show this help message
  /clear    Clear conversation history and the screen
  /quit     Exit the chat
  /exit     Exit the chat

Configuration:
  .env              DEEPSEEK_API_KEY and DEEPSEEK_BASE_URL
  systemprompt.md   System prompt sent with every request"#
}

/// Returns the startup banner.
pub fn banner_text(base_url: &str, model: &str) -> String {
    format!(
        r#"deepchat - streaming terminal chat

  API endpoint:  {base_url}
  Model:         {model}
  Streaming:     enabled

Type /help for commands, /quit to exit."#
    )
}

/// Returns the text shown on exit.
pub fn goodbye_text(turn_count: usize) -> String {
    format!("Goodbye! Turns in this session: {turn_count}")
}
