//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and resolves the
//! final configuration from flags, the environment (optionally seeded from a
//! `.env` file), and the system prompt file.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::{ChatClient, CompletionParams, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::{Error, Result};

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";

/// Environment variable holding the API base URL.
pub const BASE_URL_VAR: &str = "DEEPSEEK_BASE_URL";

/// Value shipped in the sample `.env`; treated the same as a missing key.
pub const API_KEY_PLACEHOLDER: &str = "your_deepseek_api_key_here";

/// File the system prompt is read from unless overridden.
pub const DEFAULT_SYSTEM_PROMPT_FILE: &str = "systemprompt.md";

/// System prompt used when the prompt file does not exist.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant that can answer all kinds of questions and offer help.";

/// Command-line arguments for the deepchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: deepseek-chat)", "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature 0.0-2.0 (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: 2000)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// File to read the system prompt from.
    #[arrrg(optional, "System prompt file (default: systemprompt.md)", "PATH")]
    pub system_prompt_file: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Connect/response/read timeout in seconds (default: 30)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments and the environment with appropriate defaults.
#[derive(Clone)]
pub struct ChatConfig {
    /// Bearer token for the API.
    pub api_key: String,

    /// Base URL of the API, without the `/chat/completions` suffix.
    pub base_url: String,

    /// System prompt prepended to every request.
    pub system_prompt: String,

    /// Model, temperature, and reply length.
    pub params: CompletionParams,

    /// Connect, response, and per-read timeout.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("system_prompt", &self.system_prompt)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .field("use_color", &self.use_color)
            .finish()
    }
}

impl ChatConfig {
    /// Resolves the configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first; variables that
    /// are already set win over the file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the API key is missing or still the
    /// placeholder, when the base URL or a flag is invalid, and an I/O error
    /// when the system prompt file exists but cannot be read.
    pub fn from_env(args: ChatArgs) -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env file"),
        }
        Self::resolve(args, |name| std::env::var(name).ok())
    }

    /// Resolves the configuration using `env` to look up variables.
    pub fn resolve<F>(args: ChatArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = validate_api_key(env(API_KEY_VAR))?;
        let base_url = match env(BASE_URL_VAR).filter(|url| !url.trim().is_empty()) {
            Some(url) => validate_base_url(&url)?,
            None => DEFAULT_BASE_URL.to_string(),
        };

        let prompt_file = args
            .system_prompt_file
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT_FILE);
        let system_prompt = load_system_prompt(Path::new(prompt_file))?;

        let defaults = CompletionParams::default();
        let temperature = match args.temperature.as_deref() {
            Some(value) => parse_temperature(value)?,
            None => defaults.temperature,
        };
        let max_tokens = match args.max_tokens {
            Some(0) => {
                return Err(Error::configuration(
                    "max tokens must be positive",
                    Some("--max-tokens".to_string()),
                ));
            }
            Some(max_tokens) => max_tokens,
            None => defaults.max_tokens,
        };
        let params = CompletionParams {
            model: args.model.unwrap_or(defaults.model),
            temperature,
            max_tokens,
        };

        let timeout = match args.timeout_secs {
            Some(0) => {
                return Err(Error::configuration(
                    "timeout must be positive",
                    Some("--timeout-secs".to_string()),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        Ok(ChatConfig {
            api_key,
            base_url,
            system_prompt,
            params,
            timeout,
            use_color: !args.no_color,
        })
    }

    /// Builds the HTTP client described by this configuration.
    pub fn build_client(&self) -> Result<ChatClient> {
        Ok(ChatClient::with_options(
            self.api_key.clone(),
            Some(self.base_url.clone()),
            Some(self.timeout),
        )?
        .with_params(self.params.clone()))
    }
}

/// Accepts a usable API key; rejects missing, blank, and placeholder values.
pub fn validate_api_key(api_key: Option<String>) -> Result<String> {
    match api_key.map(|key| key.trim().to_string()) {
        Some(key) if !key.is_empty() && key != API_KEY_PLACEHOLDER => Ok(key),
        _ => Err(Error::configuration(
            format!("set a valid {API_KEY_VAR} in the environment or in .env"),
            Some(API_KEY_VAR.to_string()),
        )),
    }
}

/// Checks that `base_url` is an absolute http(s) URL.
pub fn validate_base_url(base_url: &str) -> Result<String> {
    let base_url = base_url.trim();
    let parsed = url::Url::parse(base_url)?;
    match parsed.scheme() {
        "http" | "https" => Ok(base_url.to_string()),
        scheme => Err(Error::configuration(
            format!("unsupported URL scheme {scheme:?}"),
            Some(BASE_URL_VAR.to_string()),
        )),
    }
}

/// Reads and trims the system prompt, falling back to
/// [`DEFAULT_SYSTEM_PROMPT`] when the file does not exist.
pub fn load_system_prompt(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(prompt) => Ok(prompt.trim().to_string()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no system prompt file, using default");
            Ok(DEFAULT_SYSTEM_PROMPT.to_string())
        }
        Err(err) => Err(Error::io(
            format!("failed to read system prompt from {}", path.display()),
            err,
        )),
    }
}

/// Parses a sampling temperature in `0.0..=2.0`.
pub fn parse_temperature(value: &str) -> Result<f32> {
    let invalid = || {
        Error::configuration(
            "temperature expects a value between 0 and 2",
            Some("--temperature".to_string()),
        )
    };
    let parsed: f32 = value.trim().parse().map_err(|_| invalid())?;
    if parsed.is_finite() && (0.0..=2.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn args_without_prompt_file() -> ChatArgs {
        ChatArgs {
            system_prompt_file: Some("/nonexistent/deepchat/systemprompt.md".to_string()),
            ..ChatArgs::default()
        }
    }

    #[test]
    fn config_from_env_defaults() {
        let config =
            ChatConfig::resolve(args_without_prompt_file(), env_of(&[(API_KEY_VAR, "sk-1")]))
                .unwrap();
        assert_eq!(config.api_key, "sk-1");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.params, CompletionParams::default());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("deepseek-reasoner".to_string()),
            temperature: Some("1.3".to_string()),
            max_tokens: Some(512),
            timeout_secs: Some(5),
            no_color: true,
            ..args_without_prompt_file()
        };
        let env = env_of(&[
            (API_KEY_VAR, "sk-1"),
            (BASE_URL_VAR, "http://localhost:8000/v1"),
        ]);
        let config = ChatConfig::resolve(args, env).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000/v1");
        assert_eq!(config.params.model, "deepseek-reasoner");
        assert_eq!(config.params.temperature, 1.3);
        assert_eq!(config.params.max_tokens, 512);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.use_color);
    }

    #[test]
    fn missing_api_key() {
        let err = ChatConfig::resolve(args_without_prompt_file(), env_of(&[])).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn placeholder_api_key() {
        let env = env_of(&[(API_KEY_VAR, API_KEY_PLACEHOLDER)]);
        let err = ChatConfig::resolve(args_without_prompt_file(), env).unwrap_err();
        assert!(err.is_configuration());
        assert!(validate_api_key(Some("  ".to_string())).is_err());
        assert_eq!(
            validate_api_key(Some(" sk-2 \n".to_string())).unwrap(),
            "sk-2"
        );
    }

    #[test]
    fn invalid_base_url() {
        assert!(validate_base_url("not a url").unwrap_err().is_configuration());
        assert!(validate_base_url("ftp://example.com").unwrap_err().is_configuration());
        assert_eq!(
            validate_base_url(" https://example.com/v1/ ").unwrap(),
            "https://example.com/v1/"
        );
    }

    #[test]
    fn blank_base_url_uses_default() {
        let env = env_of(&[(API_KEY_VAR, "sk-1"), (BASE_URL_VAR, "  ")]);
        let config = ChatConfig::resolve(args_without_prompt_file(), env).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn temperature_range() {
        assert_eq!(parse_temperature("0").unwrap(), 0.0);
        assert_eq!(parse_temperature("2.0").unwrap(), 2.0);
        assert!(parse_temperature("2.5").is_err());
        assert!(parse_temperature("-0.1").is_err());
        assert!(parse_temperature("NaN").is_err());
        assert!(parse_temperature("warm").is_err());
    }

    #[test]
    fn zero_limits_rejected() {
        let env = env_of(&[(API_KEY_VAR, "sk-1")]);
        let args = ChatArgs {
            max_tokens: Some(0),
            ..args_without_prompt_file()
        };
        assert!(ChatConfig::resolve(args, &env).is_err());

        let args = ChatArgs {
            timeout_secs: Some(0),
            ..args_without_prompt_file()
        };
        assert!(ChatConfig::resolve(args, &env).is_err());
    }

    #[test]
    fn system_prompt_file_is_trimmed() {
        let path = std::env::temp_dir().join(format!(
            "deepchat-systemprompt-{}.md",
            std::process::id()
        ));
        std::fs::write(&path, "\n  You are terse.  \n\n").unwrap();
        let prompt = load_system_prompt(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(prompt, "You are terse.");
    }

    #[test]
    fn missing_system_prompt_file_falls_back() {
        let prompt = load_system_prompt(Path::new("/nonexistent/deepchat/prompt.md")).unwrap();
        assert_eq!(prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config =
            ChatConfig::resolve(args_without_prompt_file(), env_of(&[(API_KEY_VAR, "sk-secret")]))
                .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn build_client_uses_config() {
        let env = env_of(&[
            (API_KEY_VAR, "sk-1"),
            (BASE_URL_VAR, "http://127.0.0.1:9/v1"),
        ]);
        let config = ChatConfig::resolve(args_without_prompt_file(), env).unwrap();
        let client = config.build_client().unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(client.params(), &config.params);
    }
}
