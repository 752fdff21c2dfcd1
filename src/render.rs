//! Output rendering for streamed chat replies.
//!
//! This module provides the renderer trait the client and the turn loop write
//! through, a plain-text implementation with optional ANSI styling, and an
//! in-memory implementation for embedding and tests.

use std::io::{self, Stdout, Write};

use time::OffsetDateTime;
use time::macros::format_description;

/// ANSI escape code for dim text (used for separators).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for bright cyan text (used for info messages).
const ANSI_CYAN: &str = "\x1b[96m";

/// ANSI escape code for bright yellow text (used for warnings and timestamps).
const ANSI_YELLOW: &str = "\x1b[93m";

/// ANSI escape code for bright green text (used for success messages).
const ANSI_GREEN: &str = "\x1b[92m";

/// ANSI escape code for bright red text (used for errors).
const ANSI_RED: &str = "\x1b[91m";

/// ANSI escape code for bright magenta text (used for the response header).
const ANSI_MAGENTA: &str = "\x1b[95m";

/// ANSI escape code for bright white text (used for response bodies).
const ANSI_WHITE: &str = "\x1b[97m";

/// ANSI sequence that clears the screen and homes the cursor.
const ANSI_CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - In-memory capture for embedding the client elsewhere
pub trait Renderer: Send {
    /// Called once the server has accepted a request, before the first delta.
    fn start_response(&mut self, label: &str);

    /// Print a chunk of regular response text.
    ///
    /// This is called incrementally as deltas are streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Called when a response is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print a warning message.
    fn print_warning(&mut self, warning: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print a confirmation message.
    fn print_success(&mut self, message: &str) {
        self.print_info(message);
    }

    /// Clear the terminal, if there is one.
    fn clear_screen(&mut self) {}
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer outputs text directly to stdout (errors to stderr) with
/// optional ANSI escape codes.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    in_response: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            in_response: false,
        }
    }

    /// Returns whether ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_color {
            format!("{color}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn reset_response(&mut self) {
        if self.in_response {
            if self.use_color {
                print!("{ANSI_RESET}");
            }
            self.in_response = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self, label: &str) {
        let header = format!("┌─[{label}]─[{}]", timestamp());
        println!("\n{}", self.paint(ANSI_MAGENTA, &header));
        if self.use_color {
            print!("└─➤ {ANSI_WHITE}");
        } else {
            print!("└─➤ ");
        }
        self.in_response = true;
        self.flush();
    }

    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn finish_response(&mut self) {
        self.reset_response();
        println!();
        self.flush();
    }

    fn print_interrupted(&mut self) {
        self.reset_response();
        println!("\n{}", self.paint(ANSI_DIM, "[interrupted]"));
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.reset_response();
        self.flush();
        eprintln!("\n{}", self.paint(ANSI_RED, &format!("Error: {error}")));
    }

    fn print_warning(&mut self, warning: &str) {
        self.reset_response();
        println!("\n{}", self.paint(ANSI_YELLOW, &format!("Warning: {warning}")));
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        self.reset_response();
        println!("{}", self.paint(ANSI_CYAN, info));
        self.flush();
    }

    fn print_success(&mut self, message: &str) {
        self.reset_response();
        println!("\n{}", self.paint(ANSI_GREEN, message));
        self.flush();
    }

    fn clear_screen(&mut self) {
        if self.use_color {
            print!("{ANSI_CLEAR_SCREEN}");
            self.flush();
        }
    }
}

/// Renderer that records output in memory instead of writing to a terminal.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    /// Concatenation of every `print_text` call.
    pub text: String,
    /// Every `print_text` call, in order.
    pub chunks: Vec<String>,
    /// Labels passed to `start_response`.
    pub responses: Vec<String>,
    /// Number of `finish_response` calls.
    pub finished: usize,
    /// Whether `print_interrupted` was called.
    pub interrupted: bool,
    /// Error messages.
    pub errors: Vec<String>,
    /// Warning messages.
    pub warnings: Vec<String>,
    /// Informational and success messages.
    pub infos: Vec<String>,
    /// Number of `clear_screen` calls.
    pub clears: usize,
}

impl RecordingRenderer {
    /// Creates an empty recording renderer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for RecordingRenderer {
    fn start_response(&mut self, label: &str) {
        self.responses.push(label.to_string());
    }

    fn print_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.chunks.push(text.to_string());
    }

    fn finish_response(&mut self) {
        self.finished += 1;
    }

    fn print_interrupted(&mut self) {
        self.interrupted = true;
    }

    fn print_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }

    fn print_warning(&mut self, warning: &str) {
        self.warnings.push(warning.to_string());
    }

    fn print_info(&mut self, info: &str) {
        self.infos.push(info.to_string());
    }

    fn clear_screen(&mut self) {
        self.clears += 1;
    }
}

/// Current wall-clock time as `HH:MM:SS`, local when the offset is known.
pub fn timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}
