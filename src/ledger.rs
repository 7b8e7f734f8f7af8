//! Append-only session ledger.
//!
//! Every successfully translated chunk is recorded twice: once in an
//! in-memory list that backs the sliding context window, and once as a JSON
//! line appended to a per-run file. The file is named after the run start
//! time, opened once, and only ever appended to.

use crate::error::{ParleyError, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One translated chunk, as persisted to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationPair {
    /// Strictly increasing sequence number, starting at 1.
    pub chunk: u64,
    /// ISO-8601 timestamp of when the pair was recorded.
    pub timestamp: String,
    /// Source text as transcribed.
    pub input: String,
    /// Translated text.
    pub output: String,
}

/// Per-run ledger of translation pairs.
pub struct SessionLedger {
    path: PathBuf,
    file: File,
    pairs: Vec<TranslationPair>,
    next_chunk: u64,
}

impl SessionLedger {
    /// Create a new ledger file under `dir`, named after the current time.
    ///
    /// The directory is created if missing. The file identity is fixed for
    /// the lifetime of the ledger.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let session_id = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let path = dir.join(format!("session_{}.jsonl", session_id));
        Self::open(path)
    }

    /// Open a ledger at an explicit path (appending if it exists).
    pub fn open(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            pairs: Vec::new(),
            next_chunk: 1,
        })
    }

    /// Path of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pairs recorded so far.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The last `n` recorded pairs, oldest first.
    pub fn context(&self, n: usize) -> &[TranslationPair] {
        let start = self.pairs.len().saturating_sub(n);
        &self.pairs[start..]
    }

    /// Record a translated pair.
    ///
    /// Returns the recorded pair, or `None` when either side is empty after
    /// trimming - such pairs never reach the file, and the sequence number
    /// is not consumed.
    pub fn add_pair(&mut self, input: &str, output: &str) -> Result<Option<&TranslationPair>> {
        let input = input.trim();
        let output = output.trim();
        if input.is_empty() || output.is_empty() {
            return Ok(None);
        }

        let pair = TranslationPair {
            chunk: self.next_chunk,
            timestamp: Local::now().to_rfc3339(),
            input: input.to_string(),
            output: output.to_string(),
        };

        let line = serde_json::to_string(&pair).map_err(|e| ParleyError::Ledger {
            message: format!("failed to serialize pair: {}", e),
        })?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;

        self.next_chunk += 1;
        self.pairs.push(pair);
        Ok(self.pairs.last())
    }
}
