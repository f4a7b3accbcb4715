//! Streaming response assembly
//!
//! Generation backends disagree about what a chunk is: some deliver the
//! full text so far, some deliver true deltas, and some switch mid-stream
//! after a correction. The assembler reconstructs monotonically growing
//! clean text under that ambiguity.

/// How the producer delivers chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkMode {
    /// Unknown convention: treat a chunk extending the previous one as
    /// cumulative, anything else as a delta
    #[default]
    Auto,
    /// Every chunk is the full text so far
    Cumulative,
    /// Every chunk is a true incremental fragment
    Incremental,
}

/// Reconstructs final text from a sequence of raw stream chunks
///
/// Transient state scoped to a single streamed call; discard after
/// `finish()`.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    mode: ChunkMode,
    result: String,
    prev: String,
}

impl StreamAssembler {
    /// Create an assembler using the `Auto` heuristic
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler with an explicit chunk-delivery convention
    #[must_use]
    pub fn with_mode(mode: ChunkMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Consume one raw chunk, returning the delta that was appended
    pub fn push(&mut self, chunk: &str) -> &str {
        let start = self.result.len();

        let delta = match self.mode {
            ChunkMode::Incremental => chunk,
            ChunkMode::Cumulative => chunk.get(self.prev.len()..).unwrap_or(""),
            ChunkMode::Auto => {
                if chunk.starts_with(self.prev.as_str()) {
                    &chunk[self.prev.len()..]
                } else {
                    chunk
                }
            }
        };

        self.result.push_str(delta);
        self.prev.clear();
        self.prev.push_str(chunk);

        &self.result[start..]
    }

    /// Accumulated text so far (best-effort until the stream ends)
    #[must_use]
    pub fn current(&self) -> &str {
        &self.result
    }

    /// Finish the stream, yielding the accumulated text
    ///
    /// An empty stream yields an empty string; the caller decides whether
    /// that is meaningful.
    #[must_use]
    pub fn finish(self) -> String {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_chunks_resolve_to_last_chunk() {
        let mut asm = StreamAssembler::new();
        for chunk in ["Tell", "Tell me", "Tell me about", "Tell me about you"] {
            asm.push(chunk);
        }
        assert_eq!(asm.finish(), "Tell me about you");
    }

    #[test]
    fn delta_chunks_concatenate() {
        let mut asm = StreamAssembler::new();
        // No chunk is a prefix-extension of the previous one
        for chunk in ["Why ", "this ", "role?"] {
            asm.push(chunk);
        }
        assert_eq!(asm.finish(), "Why this role?");
    }

    #[test]
    fn mixed_convention_mid_stream() {
        let mut asm = StreamAssembler::new();
        asm.push("Hello");
        asm.push("Hello there"); // cumulative extension
        asm.push(", candidate"); // correction: plain delta
        assert_eq!(asm.finish(), "Hello there, candidate");
    }

    #[test]
    fn push_returns_the_appended_delta() {
        let mut asm = StreamAssembler::new();
        assert_eq!(asm.push("Intro"), "Intro");
        assert_eq!(asm.push("Introduce"), "duce");
        assert_eq!(asm.push(" yourself"), " yourself");
    }

    #[test]
    fn empty_stream_yields_empty_result() {
        let asm = StreamAssembler::new();
        assert_eq!(asm.finish(), "");
    }

    #[test]
    fn empty_chunks_are_harmless() {
        let mut asm = StreamAssembler::new();
        asm.push("");
        asm.push("Hi");
        asm.push("");
        // "" is a prefix of everything, so "Hi" after "" appends fully
        assert_eq!(asm.finish(), "Hi");
    }

    #[test]
    fn incremental_mode_never_diffs() {
        let mut asm = StreamAssembler::with_mode(ChunkMode::Incremental);
        asm.push("ab");
        // In Auto this would be treated as cumulative; Incremental keeps it whole
        asm.push("abc");
        assert_eq!(asm.finish(), "ababc");
    }

    #[test]
    fn cumulative_mode_ignores_shrinking_chunks() {
        let mut asm = StreamAssembler::with_mode(ChunkMode::Cumulative);
        asm.push("Hello there");
        asm.push("Hi"); // shorter than prev: nothing to append
        assert_eq!(asm.current(), "Hello there");
    }
}
