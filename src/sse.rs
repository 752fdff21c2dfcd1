//! Server-Sent Events (SSE) processing for streaming chat completions.
//!
//! The chat completion endpoint answers with a line-delimited event stream.
//! Every `data: ` line carries either a JSON chunk or the `[DONE]` sentinel.
//! This module turns the raw byte stream into a lazy stream of text deltas
//! that ends on the sentinel or when the connection closes.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_FRAMES, STREAM_MALFORMED_FRAMES};
use crate::types::ChatCompletionChunk;
use crate::{Error, Result};

/// Prefix marking a data frame.
pub const DATA_PREFIX: &str = "data: ";

/// Payload of the frame that ends the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// The meaning of one line of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Blank lines, comments, and fields other than `data`.
    Ignored,
    /// The `[DONE]` sentinel.
    Done,
    /// A decoded chunk.
    Chunk(ChatCompletionChunk),
    /// A data frame whose payload is not a JSON chunk.
    Malformed(String),
}

/// Classify a single line of the event stream.
///
/// A trailing carriage return is tolerated so that `\r\n` framed streams
/// parse the same as `\n` framed ones.
pub fn parse_line(line: &str) -> Frame {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignored;
    };
    if payload.trim() == DONE_SENTINEL {
        return Frame::Done;
    }
    match serde_json::from_str::<ChatCompletionChunk>(payload) {
        Ok(chunk) => Frame::Chunk(chunk),
        Err(_) => Frame::Malformed(payload.to_string()),
    }
}

struct Decoder<S> {
    stream: S,
    buffer: Vec<u8>,
    closed: bool,
}

impl<S> Decoder<S> {
    fn next_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        Some(line)
    }
}

/// Process a stream of bytes into a stream of text deltas.
///
/// The returned stream yields every non-empty content delta in arrival order.
/// It ends after the `[DONE]` sentinel or when the byte stream ends, and
/// yields an error for transport failures or lines that are not UTF-8.
/// Data frames that do not parse as JSON are skipped.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let decoder = Decoder {
        stream: byte_stream,
        buffer: Vec::new(),
        closed: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        loop {
            if let Some(line) = decoder.next_line() {
                let line = match std::str::from_utf8(&line) {
                    Ok(line) => line,
                    Err(e) => {
                        STREAM_ERRORS.click();
                        let err = Error::encoding(
                            format!("Invalid UTF-8 in stream: {e}"),
                            Some(Box::new(e)),
                        );
                        return Some((Err(err), decoder));
                    }
                };
                match parse_line(line) {
                    Frame::Ignored => {}
                    Frame::Done => return None,
                    Frame::Chunk(chunk) => {
                        STREAM_FRAMES.click();
                        if let Some(text) = chunk.text_delta() {
                            return Some((Ok(text.to_string()), decoder));
                        }
                    }
                    Frame::Malformed(payload) => {
                        STREAM_MALFORMED_FRAMES.click();
                        tracing::debug!(payload = %payload, "skipping malformed stream frame");
                    }
                }
                continue;
            }

            if decoder.closed {
                return None;
            }

            match decoder.stream.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    decoder.buffer.extend_from_slice(&bytes);
                }
                Some(Err(e)) => {
                    STREAM_ERRORS.click();
                    decoder.closed = true;
                    decoder.buffer.clear();
                    return Some((Err(e), decoder));
                }
                None => {
                    // A final line without a newline still counts.
                    decoder.closed = true;
                    if !decoder.buffer.is_empty() {
                        decoder.buffer.push(b'\n');
                    }
                }
            }
        }
    })
}
