//! Stream decoding
//!
//! `streamQuery` answers with newline-delimited JSON. Chunks from the HTTP
//! body can split a line anywhere, so bytes are buffered until a full line
//! is available.

use std::collections::VecDeque;
use std::fmt::Display;

use futures_util::stream::{self, Stream, StreamExt};
use serde_json::Value;

use crate::platform::adapter::{EventStream, PlatformError};

/// Incremental newline-delimited JSON decoder
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Feed a chunk and return the events completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<Value, PlatformError>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that had no newline
    pub fn finish(&mut self) -> Option<Result<Value, PlatformError>> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&rest))
    }
}

fn parse_line(line: &str) -> Option<Result<Value, PlatformError>> {
    let line = line.trim();
    // SSE framing: comments and non-data fields carry no events
    if line.is_empty() || line.starts_with(':') || line.starts_with("event:") {
        return None;
    }
    let payload = line.strip_prefix("data:").map(str::trim).unwrap_or(line);
    if payload.is_empty() {
        return None;
    }
    Some(serde_json::from_str(payload).map_err(PlatformError::from))
}

/// Turn an HTTP body stream into a stream of decoded events
///
/// A transport error ends the stream after being yielded once.
pub fn decode_events<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = (
        Box::pin(body),
        LineDecoder::default(),
        VecDeque::new(),
        false,
    );

    stream::unfold(
        state,
        |(mut body, mut decoder, mut pending, mut finished)| async move {
            loop {
                if let Some(item) = pending.pop_front() {
                    return Some((item, (body, decoder, pending, finished)));
                }
                if finished {
                    return None;
                }
                match body.next().await {
                    Some(Ok(chunk)) => pending.extend(decoder.push(chunk.as_ref())),
                    Some(Err(e)) => {
                        finished = true;
                        pending.push_back(Err(PlatformError::Stream(e.to_string())));
                    }
                    None => {
                        finished = true;
                        pending.extend(decoder.finish());
                    }
                }
            }
        },
    )
    .boxed()
}
