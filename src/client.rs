use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::accumulating_stream::{AccumulatingStream, DeltaStream};
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS};
use crate::render::Renderer;
use crate::sse::process_sse;
use crate::types::{ChatCompletionRequest, Message};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "deepseek-chat";
/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Maximum reply length used when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
/// Bound on connecting, on waiting for response headers, and on each stream read.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Label shown above streamed replies.
const RESPONSE_LABEL: &str = "DEEPSEEK";

/// Fixed parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    /// The model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl CompletionParams {
    /// Builds the request body for `messages`.
    pub fn request(&self, messages: Vec<Message>) -> ChatCompletionRequest {
        ChatCompletionRequest::new(
            self.model.clone(),
            messages,
            self.temperature,
            self.max_tokens,
        )
    }
}

/// Something that can turn a message list into a streamed, rendered reply.
///
/// [`ChatClient`] is the HTTP implementation; the turn loop only depends on
/// this trait.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Performs one request/response cycle.
    ///
    /// Deltas are forwarded to `renderer` as they arrive. Returns the full
    /// reply, which may be empty.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures, non-success statuses,
    /// timeouts, and [`Error::Abort`] when `cancel` fires.
    async fn complete(
        &self,
        messages: Vec<Message>,
        renderer: &mut dyn Renderer,
        cancel: &CancellationToken,
    ) -> Result<String>;
}

/// Client for an OpenAI-compatible chat completion API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    api_key: String,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    params: CompletionParams,
}

impl ChatClient {
    /// Create a new client for the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::configuration(
                "API key must not be empty",
                Some("api_key".to_string()),
            ));
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout,
            params: CompletionParams::default(),
        })
    }

    /// Sets the parameters sent with every request.
    pub fn with_params(mut self, params: CompletionParams) -> Self {
        self.params = params;
        self
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the parameters sent with every request.
    pub fn params(&self) -> &CompletionParams {
        &self.params
    }

    /// The chat completion endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
            Error::configuration(
                "API key contains characters not allowed in a header",
                Some("api_key".to_string()),
            )
        })?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type.
    ///
    /// Reading the error body is bounded by `timeout`.
    async fn process_error_response(response: Response, timeout: Duration) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
            param: Option<String>,
        }

        let error_body = match tokio::time::timeout(timeout, response.text()).await {
            Ok(Ok(body)) => body,
            Err(_) => {
                return Error::timeout(
                    format!("Timed out reading the {status_code} error response"),
                    Some(timeout.as_secs_f64()),
                );
            }
            Ok(Err(e)) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
        let error_param = detail.as_ref().and_then(|e| e.param.clone());
        let error_message = detail
            .and_then(|e| e.message)
            .unwrap_or_else(|| match error_body.trim() {
                "" => status.canonical_reason().unwrap_or("no body").to_string(),
                body => body.to_string(),
            });

        match status_code {
            400 | 422 => Error::bad_request(error_message, error_param),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message, request_id),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_type, error_message, request_id),
        }
    }

    /// Send a request and get a stream of text deltas.
    ///
    /// Resolves once the server has answered with a success status; the
    /// returned stream then yields content deltas until the `[DONE]`
    /// sentinel or the end of the body.
    pub async fn stream(&self, request: &ChatCompletionRequest) -> Result<DeltaStream> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.open_stream(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            tracing::warn!(error = %err, "chat completion request failed");
        }
        result
    }

    async fn open_stream(&self, request: &ChatCompletionRequest) -> Result<DeltaStream> {
        let url = self.endpoint();
        tracing::debug!(
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion request"
        );

        let pending = self
            .client
            .post(&url)
            .headers(self.default_headers()?)
            .json(request)
            .send();

        let response = tokio::time::timeout(self.timeout, pending)
            .await
            .map_err(|_| {
                Error::timeout(
                    "Request timed out waiting for a response",
                    Some(self.timeout.as_secs_f64()),
                )
            })?
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response, self.timeout).await);
        }

        let bytes = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                Error::streaming(format!("Error in HTTP stream: {}", e), Some(Box::new(e)))
            })
        });
        Ok(Box::pin(process_sse(bytes)))
    }
}

#[async_trait::async_trait]
impl CompletionClient for ChatClient {
    async fn complete(
        &self,
        messages: Vec<Message>,
        renderer: &mut dyn Renderer,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let request = self.params.request(messages);
        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                renderer.print_interrupted();
                return Err(Error::abort("interrupted by user"));
            }
            stream = self.stream(&request) => stream?,
        };
        renderer.start_response(RESPONSE_LABEL);
        AccumulatingStream::new(stream)
            .with_read_timeout(self.timeout)
            .drain(renderer, cancel)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = ChatClient::new("test-key").unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(client.params(), &CompletionParams::default());

        let client = ChatClient::with_options(
            "test-key",
            Some("https://custom-api.example.com/v1/".to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://custom-api.example.com/v1/");
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = ChatClient::new("  ").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client = ChatClient::new("k").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.deepseek.com/v1/chat/completions"
        );

        let client =
            ChatClient::with_options("k", Some("http://localhost:8080/v1/".to_string()), None)
                .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn default_headers_carry_bearer_token() {
        let client = ChatClient::new("sk-123").unwrap();
        let headers = client.default_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer sk-123");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::ACCEPT], "text/event-stream");
    }

    #[test]
    fn invalid_header_key_is_a_configuration_error() {
        let client = ChatClient::new("bad\nkey").unwrap();
        assert!(client.default_headers().unwrap_err().is_configuration());
    }

    #[test]
    fn params_build_streaming_request() {
        let params = CompletionParams {
            model: "deepseek-reasoner".to_string(),
            temperature: 0.2,
            max_tokens: 64,
        };
        let client = ChatClient::new("k").unwrap().with_params(params);
        let request = client.params().request(vec![Message::user("hello")]);
        assert_eq!(request.model, "deepseek-reasoner");
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, 64);
        assert!(request.stream);
        assert_eq!(request.messages, vec![Message::user("hello")]);
    }
}
