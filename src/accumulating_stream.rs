//! Accumulates streamed text deltas into the complete reply while rendering them.

use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::observability::{STREAM_DURATION, STREAM_INTERRUPTS};
use crate::{Error, Renderer, Result};

/// A boxed stream of text deltas, as produced by [`crate::sse::process_sse`].
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Drains a delta stream, forwarding every delta to a renderer and keeping
/// the concatenation.
///
/// Each read waits at most `read_timeout`. Cancelling the token aborts the
/// read immediately; the partially accumulated text is discarded and the
/// underlying stream (and with it the connection) is dropped.
pub struct AccumulatingStream {
    inner: DeltaStream,
    text: String,
    read_timeout: Option<Duration>,
}

impl AccumulatingStream {
    /// Wraps a delta stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<String>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            text: String::new(),
            read_timeout: None,
        }
    }

    /// Bounds how long a single read may wait for the next delta.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = Some(read_timeout);
        self
    }

    /// Returns the text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Reads the stream to its end, rendering deltas as they arrive.
    ///
    /// Returns the full reply, which is empty when the stream carried no
    /// content.
    ///
    /// # Errors
    ///
    /// Returns the first transport error of the stream, [`Error::Timeout`]
    /// when a read exceeds the read timeout, and [`Error::Abort`] when the
    /// token is cancelled.
    pub async fn drain(
        mut self,
        renderer: &mut dyn Renderer,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let start = Instant::now();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    STREAM_INTERRUPTS.click();
                    renderer.print_interrupted();
                    return Err(Error::abort("interrupted by user"));
                }
                next = self.read_next() => next,
            };
            match next? {
                Some(delta) => {
                    renderer.print_text(&delta);
                    self.text.push_str(&delta);
                }
                None => break,
            }
        }
        STREAM_DURATION.add(start.elapsed().as_secs_f64());
        renderer.finish_response();
        Ok(self.text)
    }

    async fn read_next(&mut self) -> Result<Option<String>> {
        let next = match self.read_timeout {
            Some(read_timeout) => tokio::time::timeout(read_timeout, self.inner.next())
                .await
                .map_err(|_| {
                    Error::timeout(
                        "no data received from the stream",
                        Some(read_timeout.as_secs_f64()),
                    )
                })?,
            None => self.inner.next().await,
        };
        next.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingRenderer;
    use futures::stream;

    fn deltas(parts: Vec<Result<String>>) -> AccumulatingStream {
        AccumulatingStream::new(stream::iter(parts))
    }

    #[tokio::test]
    async fn accumulates_and_renders_in_order() {
        let stream = deltas(vec![Ok("Hi".to_string()), Ok(" there".to_string())]);
        let mut renderer = RecordingRenderer::new();
        let text = stream
            .drain(&mut renderer, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(text, "Hi there");
        assert_eq!(renderer.chunks, vec!["Hi", " there"]);
        assert_eq!(renderer.finished, 1);
    }

    #[tokio::test]
    async fn empty_stream_yields_empty_text() {
        let mut renderer = RecordingRenderer::new();
        let text = deltas(vec![])
            .drain(&mut renderer, &CancellationToken::new())
            .await
            .unwrap();
        assert!(text.is_empty());
        assert_eq!(renderer.finished, 1);
    }

    #[tokio::test]
    async fn transport_error_is_returned() {
        let stream = deltas(vec![
            Ok("partial".to_string()),
            Err(Error::streaming("reset", None)),
        ]);
        let mut renderer = RecordingRenderer::new();
        let result = stream
            .drain(&mut renderer, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(Error::Streaming { .. })));
        assert_eq!(renderer.text, "partial");
        assert_eq!(renderer.finished, 0);
    }

    #[tokio::test]
    async fn cancellation_aborts() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stream = AccumulatingStream::new(stream::pending::<Result<String>>());
        let mut renderer = RecordingRenderer::new();
        let result = stream.drain(&mut renderer, &cancel).await;
        assert!(result.unwrap_err().is_abort());
        assert!(renderer.interrupted);
    }

    #[tokio::test(start_paused = true)]
    async fn read_timeout() {
        let stream = AccumulatingStream::new(stream::pending::<Result<String>>())
            .with_read_timeout(Duration::from_secs(30));
        let mut renderer = RecordingRenderer::new();
        let result = stream
            .drain(&mut renderer, &CancellationToken::new())
            .await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[test]
    fn text_starts_empty() {
        let stream = deltas(vec![]);
        assert_eq!(stream.text(), "");
    }
}
