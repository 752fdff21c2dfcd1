use serde::{Deserialize, Serialize};

/// The incremental content carried by one streamed choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// The role, sent by some servers on the first frame only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// A fragment of the assistant's reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One choice inside a streamed chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// The choice index.
    #[serde(default)]
    pub index: u32,

    /// The incremental delta for this choice.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Why generation stopped, present on the last frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// The JSON payload of a single `data:` frame in a streamed chat completion.
///
/// Fields the client does not use (ids, usage, timestamps) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// The streamed choices; the client only reads the first.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    /// Returns the first choice's content delta when it is present and non-empty.
    pub fn text_delta(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_with_content() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"abc","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.text_delta(), Some("Hi"));
    }

    #[test]
    fn chunk_with_role_only() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#)
                .unwrap();
        assert_eq!(chunk.text_delta(), None);
        assert_eq!(chunk.choices[0].delta.role.as_deref(), Some("assistant"));
    }

    #[test]
    fn chunk_with_empty_content() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":""}}]}"#).unwrap();
        assert_eq!(chunk.text_delta(), None);
    }

    #[test]
    fn chunk_without_choices() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"usage":{"total_tokens":12}}"#).unwrap();
        assert!(chunk.choices.is_empty());
        assert_eq!(chunk.text_delta(), None);
    }

    #[test]
    fn chunk_reads_first_choice_only() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"content":"a"}},{"index":1,"delta":{"content":"b"}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.text_delta(), Some("a"));
    }

    #[test]
    fn finish_reason() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#)
                .unwrap();
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(chunk.text_delta(), None);
    }
}
