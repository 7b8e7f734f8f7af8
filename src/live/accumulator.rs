//! Utterance accumulation and flush policy.
//!
//! Transcript fragments stream in a few words at a time. The accumulator
//! concatenates them into an utterance buffer and decides when the buffer
//! becomes a chunk worth translating:
//!
//! - after `max_buffer` elapsed with content (latency bound), or
//! - at a sentence boundary once `sentence_min` has elapsed (quality
//!   preference), or
//! - immediately on an interruption event.
//!
//! Fragments that fail the source-language check are dropped silently -
//! cross-language bleed never enters the buffer.

use crate::config::FlushConfig;
use crate::lang::{self, SourceMode};
use crate::live::event::LiveEvent;
use std::time::{Duration, Instant};

/// A completed utterance, ready for translation. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
}

/// Accumulates transcript fragments into flushable chunks.
pub struct TranscriptAccumulator {
    mode: SourceMode,
    max_buffer: Duration,
    sentence_min: Duration,
    buffer: String,
    last_flush: Instant,
}

impl TranscriptAccumulator {
    /// Create an accumulator for the given source mode.
    ///
    /// The sentence-flush minimum depends on the mode: mixed sessions flush
    /// at sentence boundaries sooner than bilingual ones.
    pub fn new(mode: SourceMode, flush: &FlushConfig) -> Self {
        Self::new_at(mode, flush, Instant::now())
    }

    /// Create an accumulator with an explicit epoch (injectable for tests).
    pub fn new_at(mode: SourceMode, flush: &FlushConfig, now: Instant) -> Self {
        let sentence_min = match mode {
            SourceMode::Mixed => flush.sentence_min_mixed_secs,
            SourceMode::Bilingual(_) => flush.sentence_min_bilingual_secs,
        };
        Self {
            mode,
            max_buffer: Duration::from_secs_f64(flush.max_buffer_secs),
            sentence_min: Duration::from_secs_f64(sentence_min),
            buffer: String::new(),
            last_flush: now,
        }
    }

    /// Current buffered text (possibly mid-utterance).
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Absorb one session event, possibly producing a flushed chunk.
    pub fn absorb(&mut self, event: &LiveEvent) -> Option<Chunk> {
        self.absorb_at(event, Instant::now())
    }

    /// Absorb with an explicit clock (injectable for tests).
    pub fn absorb_at(&mut self, event: &LiveEvent, now: Instant) -> Option<Chunk> {
        match event {
            LiveEvent::Fragment(text) => {
                // Noise markers pass through to the buffer; anything else
                // must pass the language filter.
                if lang::is_noise_marker(text) || self.mode.accepts(text) {
                    self.buffer.push_str(text);
                }
                self.evaluate_flush(now)
            }
            LiveEvent::Interrupted => {
                // The utterance ended abruptly; whatever we have is final.
                let chunk = self.take_chunk();
                self.last_flush = now;
                chunk
            }
            LiveEvent::SetupComplete
            | LiveEvent::CloseWarning { .. }
            | LiveEvent::ResumptionUpdate { .. } => None,
        }
    }

    /// Flush any residual buffer on stream termination.
    ///
    /// Idempotent: the buffer is consumed, so a second call yields nothing.
    pub fn flush_residual(&mut self) -> Option<Chunk> {
        self.take_chunk()
    }

    fn evaluate_flush(&mut self, now: Instant) -> Option<Chunk> {
        if self.buffer.trim().is_empty() {
            return None;
        }
        let elapsed = now.duration_since(self.last_flush);

        let should_flush = elapsed >= self.max_buffer
            || (elapsed >= self.sentence_min && lang::ends_with_sentence(&self.buffer));

        if should_flush {
            let chunk = self.take_chunk();
            self.last_flush = now;
            chunk
        } else {
            None
        }
    }

    fn take_chunk(&mut self) -> Option<Chunk> {
        let text = std::mem::take(&mut self.buffer);
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(Chunk {
                text: text.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Language;

    fn fragment(text: &str) -> LiveEvent {
        LiveEvent::Fragment(text.to_string())
    }

    fn accumulator(mode: SourceMode, start: Instant) -> TranscriptAccumulator {
        TranscriptAccumulator::new_at(mode, &FlushConfig::default(), start)
    }

    #[test]
    fn test_sentence_end_flushes_before_timeout() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Bilingual(Language::English), start);

        // Sentence completed 4s in - past the 3s bilingual minimum,
        // well before the 10s cap.
        assert!(
            acc.absorb_at(&fragment("Hello "), start + Duration::from_secs(2))
                .is_none()
        );
        let chunk = acc
            .absorb_at(&fragment("world."), start + Duration::from_secs(4))
            .expect("sentence end should flush");
        assert_eq!(chunk.text, "Hello world.");
        assert!(acc.buffered().is_empty());
    }

    #[test]
    fn test_sentence_end_respects_minimum_elapsed() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Bilingual(Language::English), start);

        // Sentence ends at 2s, but bilingual mode requires 3s
        assert!(
            acc.absorb_at(&fragment("Too soon."), start + Duration::from_secs(2))
                .is_none()
        );
        assert_eq!(acc.buffered(), "Too soon.");
    }

    #[test]
    fn test_mixed_mode_uses_shorter_sentence_minimum() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Mixed, start);

        // 2s elapsed clears the 1s mixed-mode minimum
        let chunk = acc
            .absorb_at(&fragment("Quick one."), start + Duration::from_secs(2))
            .expect("mixed mode should flush at sentence end after 1s");
        assert_eq!(chunk.text, "Quick one.");
    }

    #[test]
    fn test_timeout_flush_without_sentence_terminator() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Bilingual(Language::English), start);

        assert!(
            acc.absorb_at(&fragment("no punctuation here "), start + Duration::from_secs(5))
                .is_none()
        );
        assert!(
            acc.absorb_at(&fragment("still going "), start + Duration::from_secs(9))
                .is_none()
        );
        let chunk = acc
            .absorb_at(&fragment("and more"), start + Duration::from_secs(10))
            .expect("10s cap should force a flush");
        assert_eq!(chunk.text, "no punctuation here still going and more");
    }

    #[test]
    fn test_exactly_one_flush_at_timeout() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Bilingual(Language::English), start);

        acc.absorb_at(&fragment("words "), start + Duration::from_secs(10))
            .expect("flush at the boundary");
        // Timer reset: immediately-following fragments accumulate again
        assert!(
            acc.absorb_at(&fragment("next"), start + Duration::from_secs(11))
                .is_none()
        );
        assert_eq!(acc.buffered(), "next");
    }

    #[test]
    fn test_interruption_forces_immediate_flush() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Bilingual(Language::English), start);

        acc.absorb_at(&fragment("cut off mid"), start + Duration::from_millis(500));
        let chunk = acc
            .absorb_at(&LiveEvent::Interrupted, start + Duration::from_millis(600))
            .expect("interruption flushes regardless of elapsed time");
        assert_eq!(chunk.text, "cut off mid");
        assert!(acc.buffered().is_empty());
    }

    #[test]
    fn test_interruption_with_empty_buffer_produces_nothing() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Bilingual(Language::English), start);
        assert!(acc.absorb_at(&LiveEvent::Interrupted, start).is_none());
    }

    #[test]
    fn test_cross_language_fragments_dropped_silently() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Bilingual(Language::English), start);

        acc.absorb_at(&fragment("hello there "), start + Duration::from_secs(1));
        acc.absorb_at(&fragment("안녕하세요"), start + Duration::from_secs(1));
        assert_eq!(acc.buffered(), "hello there ");
    }

    #[test]
    fn test_noise_markers_enter_buffer() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Bilingual(Language::English), start);

        acc.absorb_at(&fragment("<noise>"), start + Duration::from_secs(1));
        assert_eq!(acc.buffered(), "<noise>");
    }

    #[test]
    fn test_flush_residual_is_exactly_once() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Bilingual(Language::English), start);

        acc.absorb_at(&fragment("tail end"), start + Duration::from_secs(1));
        let chunk = acc.flush_residual().expect("residual buffer flushed");
        assert_eq!(chunk.text, "tail end");
        assert!(acc.flush_residual().is_none());
    }

    #[test]
    fn test_whitespace_only_buffer_never_flushes() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Mixed, start);

        acc.absorb_at(&fragment("   "), start + Duration::from_secs(20));
        assert!(acc.flush_residual().is_none());
    }

    #[test]
    fn test_non_content_events_do_not_flush() {
        let start = Instant::now();
        let mut acc = accumulator(SourceMode::Mixed, start);

        acc.absorb_at(&fragment("pending text"), start + Duration::from_millis(100));
        let late = start + Duration::from_secs(30);
        assert!(
            acc.absorb_at(
                &LiveEvent::ResumptionUpdate {
                    handle: "h".to_string()
                },
                late
            )
            .is_none()
        );
        assert!(
            acc.absorb_at(&LiveEvent::CloseWarning { time_left: None }, late)
                .is_none()
        );
        // Text still buffered, flushed on the next fragment arrival
        assert!(acc.absorb_at(&fragment(" done"), late).is_some());
    }
}
