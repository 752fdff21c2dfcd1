//! A streaming terminal client for DeepSeek-compatible chat completion APIs.
//!
//! The [`ChatClient`] posts a conversation to `{base_url}/chat/completions`
//! with `stream: true` and turns the server-sent event body into a stream of
//! text deltas. The [`chat`] module builds an interactive session on top: a
//! bounded history, slash commands, and a turn loop that only records a turn
//! once its reply has arrived in full.

pub mod accumulating_stream;
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;

pub use client::{ChatClient, CompletionClient, CompletionParams};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, RecordingRenderer, Renderer};
pub use types::*;
