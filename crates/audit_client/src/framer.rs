//! Reassembles newline-delimited records from arbitrarily split byte fragments.

use futures::{stream, Stream, StreamExt};
use tracing::debug;

/// Carry buffer holding bytes received since the last newline.
///
/// Framing happens on bytes, not text, so a multi-byte character split across
/// two fragments is decoded only once its line is complete.
#[derive(Debug, Default)]
pub struct LineFramer {
    carry: Vec<u8>,
    scanned: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment and returns the complete lines it terminated.
    pub fn push(&mut self, fragment: &[u8]) -> Lines<'_> {
        self.feed(fragment);
        Lines { framer: self }
    }

    pub fn feed(&mut self, fragment: &[u8]) {
        self.carry.extend_from_slice(fragment);
    }

    pub fn next_line(&mut self) -> Option<String> {
        let Some(offset) = self.carry[self.scanned..]
            .iter()
            .position(|byte| *byte == b'\n')
        else {
            self.scanned = self.carry.len();
            return None;
        };
        let end = self.scanned + offset;
        let line = String::from_utf8_lossy(&self.carry[..end]).into_owned();
        self.carry.drain(..=end);
        self.scanned = 0;
        Some(line)
    }

    /// Bytes held back waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Ends framing. An unterminated tail is dropped, never emitted as a line;
    /// returns how many bytes were dropped.
    pub fn finish(&mut self) -> usize {
        let dropped = self.carry.len();
        self.carry.clear();
        self.scanned = 0;
        dropped
    }
}

pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_line()
    }
}

/// Lazily turns a fragment stream into a line stream.
///
/// Upstream errors are yielded in order and end the line stream.
pub fn frame_lines<S, E>(fragments: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<Vec<u8>, E>> + Unpin,
{
    stream::unfold(
        (fragments, LineFramer::new(), false),
        |(mut fragments, mut framer, mut done)| async move {
            loop {
                if let Some(line) = framer.next_line() {
                    return Some((Ok(line), (fragments, framer, done)));
                }
                if done {
                    return None;
                }
                match fragments.next().await {
                    Some(Ok(fragment)) => framer.feed(&fragment),
                    Some(Err(err)) => return Some((Err(err), (fragments, framer, true))),
                    None => {
                        let dropped = framer.finish();
                        if dropped > 0 {
                            debug!(dropped, "framer: discarding unterminated trailing data");
                        }
                        done = true;
                    }
                }
            }
        },
    )
}

#[cfg(test)]
#[path = "tests/framer_tests.rs"]
mod tests;
