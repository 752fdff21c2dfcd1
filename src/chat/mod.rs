//! Interactive chat on top of the streaming client.
//!
//! - [`config`]: command-line flags, `.env`, and the system prompt file
//! - [`session`]: the system prompt plus the rolling [`ConversationHistory`]
//! - [`commands`]: slash command parsing and the fixed texts
//! - [`orchestrator`]: routes each input line to a command or a chat turn

mod commands;
mod config;
mod history;
mod orchestrator;
mod session;

pub use commands::{ChatCommand, banner_text, goodbye_text, help_text, parse_command};
pub use config::{
    API_KEY_PLACEHOLDER, API_KEY_VAR, BASE_URL_VAR, ChatArgs, ChatConfig, DEFAULT_SYSTEM_PROMPT,
    DEFAULT_SYSTEM_PROMPT_FILE, load_system_prompt, parse_temperature, validate_api_key,
    validate_base_url,
};
pub use history::{ConversationHistory, DEFAULT_MAX_TURNS};
pub use orchestrator::{LineOutcome, LoopControl, Orchestrator};
pub use session::ChatSession;
