//! Line framing and frame decoding for the `append_message` event stream.
//!
//! The stream is read one logical line at a time. Physical reads may end in
//! the middle of a line; such fragments stay in a [`LineBuffer`] until the
//! terminating `\n` shows up. Only complete lines are handed to
//! [`decode_frame`].
//!
//! A line counts as a data frame when it starts with `data: ` and ends with
//! `}`. That suffix test is a cheap completeness check, not a JSON parse: a
//! truncated object whose text happens to end in `}` passes it and is then
//! rejected by the decoder as [`FrameOutcome::Malformed`].

use std::collections::VecDeque;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::error::ClaudeWebError;
use crate::events::{CompletionFrame, StreamEvent};

/// Prefix carried by every data frame.
pub const FRAME_MARKER: &[u8] = b"data: ";

/// Result of interpreting one complete line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not a data frame, or visibly incomplete.
    Skipped,
    /// Looked complete but failed to decode.
    Malformed(String),
    Event(StreamEvent),
}

/// Interpret one complete line of the event stream.
pub fn decode_frame(line: &[u8]) -> FrameOutcome {
    let Some(payload) = line.strip_prefix(FRAME_MARKER) else {
        return FrameOutcome::Skipped;
    };
    if !payload.ends_with(b"}") {
        return FrameOutcome::Skipped;
    }

    match serde_json::from_slice::<CompletionFrame>(payload) {
        Ok(frame) => FrameOutcome::Event(StreamEvent::from_frame(frame, payload.to_vec())),
        Err(error) => FrameOutcome::Malformed(error.to_string()),
    }
}

/// Accumulates physical reads into complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append one physical read and drain every line it completes.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        let mut rest = bytes;

        while let Some(split) = rest.iter().position(|byte| *byte == b'\n') {
            self.pending.extend_from_slice(&rest[..split]);
            lines.push(strip_carriage_return(std::mem::take(&mut self.pending)));
            rest = &rest[split + 1..];
        }
        self.pending.extend_from_slice(rest);

        lines
    }

    /// Flush an unterminated final line at end of stream.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            return None;
        }
        Some(strip_carriage_return(std::mem::take(&mut self.pending)))
    }

    /// True while a line is still waiting for its remaining fragments.
    pub fn has_partial_line(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn strip_carriage_return(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    line
}

/// Reads complete lines from a response byte stream.
pub struct LineReader<S> {
    inner: S,
    buffer: LineBuffer,
    ready: VecDeque<Vec<u8>>,
    exhausted: bool,
}

impl<S> LineReader<S>
where
    S: Stream<Item = Result<Bytes, ClaudeWebError>> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: LineBuffer::default(),
            ready: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Next complete line, `Ok(None)` at end of stream.
    ///
    /// Read failures surface as [`ClaudeWebError::StreamRead`].
    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>, ClaudeWebError> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(Some(line));
            }
            if self.exhausted {
                return Ok(None);
            }

            match self.inner.next().await {
                Some(Ok(chunk)) => self.ready.extend(self.buffer.push(&chunk)),
                Some(Err(error)) => {
                    self.exhausted = true;
                    return Err(into_read_error(error));
                }
                None => {
                    self.exhausted = true;
                    self.ready.extend(self.buffer.finish());
                }
            }
        }
    }
}

fn into_read_error(error: ClaudeWebError) -> ClaudeWebError {
    match error {
        error @ ClaudeWebError::StreamRead(_) => error,
        other => ClaudeWebError::StreamRead(other.to_string()),
    }
}
