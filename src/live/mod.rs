//! Live transcription: session client, event model, utterance
//! accumulation, and connection supervision.
//!
//! ```text
//! ┌─────────┐   frames   ┌────────┐            ┌─────────────────────┐
//! │ Capture │───────────▶│ Uplink │──────────▶ │  remote session     │
//! └─────────┘            └────────┘            └──────────┬──────────┘
//!                                                  events │
//!                        ┌─────────────────────┐          ▼
//!          chunks        │ Receive/Accumulate  │◀─────────┘
//!        ┌───────────────│  (flush policy)     │
//!        ▼               └─────────────────────┘
//! ┌────────────┐   pairs   ┌────────────────┐
//! │ Translate  │──────────▶│ Session ledger │
//! └────────────┘           └────────────────┘
//! ```
//!
//! The supervisor wraps one instance of this per connection and restarts
//! it across session-timeout boundaries with a resumption token.

pub mod accumulator;
pub mod event;
pub mod session;
pub mod supervisor;

pub use accumulator::{Chunk, TranscriptAccumulator};
pub use event::LiveEvent;
pub use supervisor::{ConnectionSupervisor, ResumptionToken, SupervisorConfig};
