//! Interactive streaming chat against a DeepSeek-compatible API.
//!
//! # Usage
//!
//! ```bash
//! # DEEPSEEK_API_KEY comes from the environment or ./.env
//! deepchat
//!
//! # Override the model and sampling
//! deepchat --model deepseek-reasoner --temperature 0.2 --max-tokens 4000
//!
//! # Plain output, verbose logs on stderr
//! RUST_LOG=deepchat=debug deepchat --no-color
//! ```
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history and the screen
//! - `/quit`, `/exit` - Exit the application
//!
//! Ctrl+C while a reply is streaming stops that reply; at the prompt it exits.

use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use deepchat::chat::{
    ChatArgs, ChatConfig, ChatSession, LoopControl, Orchestrator, banner_text, goodbye_text,
};
use deepchat::{PlainTextRenderer, Renderer};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let (args, _) = ChatArgs::from_command_line_relaxed("deepchat [OPTIONS]");
    let config = match ChatConfig::from_env(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "resolved configuration");

    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let client = match config.build_client() {
        Ok(client) => client,
        Err(err) => {
            renderer.print_error(&err.to_string());
            return ExitCode::FAILURE;
        }
    };
    let banner = banner_text(client.base_url(), &client.params().model);
    let session = ChatSession::new(Some(config.system_prompt.clone()));
    let mut orchestrator = Orchestrator::new(client, session).with_banner(banner.clone());

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            renderer.print_error(&format!("Input error: {err}"));
            return ExitCode::FAILURE;
        }
    };

    // Token for the turn in flight; Ctrl+C outside the line editor cancels it.
    let current = Arc::new(Mutex::new(CancellationToken::new()));
    let handler_token = Arc::clone(&current);
    if let Err(err) = ctrlc::set_handler(move || {
        if let Ok(token) = handler_token.lock() {
            token.cancel();
        }
    }) {
        renderer.print_error(&format!("Failed to install Ctrl+C handler: {err}"));
        return ExitCode::FAILURE;
    }

    renderer.print_info(&banner);

    let mut status = ExitCode::SUCCESS;
    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.trim());
                }
                let cancel = CancellationToken::new();
                if let Ok(mut slot) = current.lock() {
                    *slot = cancel.clone();
                }
                let outcome = orchestrator.handle_line(&line, &mut renderer, &cancel).await;
                tracing::debug!(?outcome, "handled line");
                if outcome.control() == LoopControl::Quit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                status = ExitCode::FAILURE;
                break;
            }
        }
    }

    renderer.print_info(&goodbye_text(orchestrator.session().turn_count()));
    status
}
