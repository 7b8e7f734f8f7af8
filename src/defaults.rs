//! Default configuration constants for parley.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

use std::time::Duration;

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and is the rate the live
/// transcription session expects for raw PCM input.
pub const SAMPLE_RATE: u32 = 16_000;

/// Number of samples per captured audio frame.
///
/// 1024 samples at 16kHz is 64ms of audio - small enough to keep uplink
/// latency low, large enough to keep per-message overhead reasonable.
pub const FRAME_SIZE: usize = 1024;

/// Maximum time a buffer may accumulate before it is force-flushed.
///
/// Bounds worst-case translation latency when speech never reaches a
/// sentence boundary.
pub const MAX_BUFFER_SECS: f64 = 10.0;

/// Minimum elapsed time before a sentence-end flush in mixed-language mode.
pub const SENTENCE_FLUSH_MIN_MIXED_SECS: f64 = 1.0;

/// Minimum elapsed time before a sentence-end flush in bilingual mode.
///
/// Longer than the mixed-mode minimum: single-language sessions read
/// better with fewer, fuller chunks.
pub const SENTENCE_FLUSH_MIN_BILINGUAL_SECS: f64 = 3.0;

/// Minimum chunk length (trimmed characters) worth translating.
///
/// Shorter chunks are almost always stray noise or fillers and produce bad
/// translations.
pub const MIN_CHUNK_CHARS: usize = 5;

/// Number of recent translation pairs included as context in each request.
pub const CONTEXT_PAIRS: usize = 5;

/// Hard wall-clock cap on a single live connection.
///
/// 14 minutes - below the provider's own session lifetime, so the reconnect
/// happens on our schedule with a fresh resumption token in hand, not on
/// the server's.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(840);

/// Fixed delay before reconnecting after a connection error.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

/// How long the supervisor waits for in-flight translations to finish and
/// be persisted during teardown.
pub const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Poll timeout for queue reads in the uplink and translate tasks.
///
/// Short enough that a shutdown signal is observed promptly, long enough
/// not to spin.
pub const QUEUE_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Capacity of the frame queue between capture and uplink.
pub const FRAME_QUEUE_CAPACITY: usize = 64;

/// Capacity of the chunk queue between the accumulator and the translator.
pub const CHUNK_QUEUE_CAPACITY: usize = 16;

/// Live transcription model served over the streaming session.
pub const LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-12-2025";

/// Model used for per-chunk translation calls.
pub const TRANSLATE_MODEL: &str = "gemini-2.5-flash-lite";

/// Model used for the batch file transcription subcommand.
pub const TRANSCRIBE_MODEL: &str = "gemini-3-pro-preview";

/// Directory (relative to the working directory) where session ledgers go.
pub const LEDGER_DIR: &str = "history";

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
