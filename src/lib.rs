//! parley - live speech translation for the terminal
//!
//! Streams microphone audio to a remote transcription session, chunks the
//! transcript at sentence and latency boundaries, translates each chunk
//! with sliding context, and appends every pair to a per-run ledger -
//! continuously, across forced session reconnects.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod gemini;
pub mod lang;
pub mod ledger;
pub mod live;
pub mod transcribe;
pub mod translate;

// Core data flow types
pub use audio::AudioFrame;
pub use lang::{Language, SourceMode};
pub use ledger::{SessionLedger, TranslationPair};
pub use live::{Chunk, ConnectionSupervisor, LiveEvent, TranscriptAccumulator};
pub use translate::{TranslationClient, TranslationWorker};

// Error handling
pub use error::{ParleyError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
