use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Request body for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// The model identifier, e.g. `deepseek-chat`.
    pub model: String,

    /// The messages of the conversation, oldest first.
    pub messages: Vec<Message>,

    /// Whether the server should stream the reply as server-sent events.
    pub stream: bool,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    /// Create a new streaming request.
    pub fn new(
        model: impl Into<String>,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            temperature,
            max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn request_serialization() {
        let request = ChatCompletionRequest::new(
            "deepseek-chat",
            vec![Message::system("Be brief."), Message::user("Hello")],
            0.5,
            2000,
        );
        let json = to_value(&request).unwrap();

        assert_eq!(
            json,
            json!({
                "model": "deepseek-chat",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Hello"}
                ],
                "stream": true,
                "temperature": 0.5,
                "max_tokens": 2000
            })
        );
    }

    #[test]
    fn new_requests_stream() {
        let request = ChatCompletionRequest::new("m", vec![], 0.7, 1);
        assert!(request.stream);
    }
}
