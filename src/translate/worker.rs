//! Translation worker task.
//!
//! Consumes completed chunks in strict FIFO order - one at a time, never in
//! parallel, because each request's context window depends on every prior
//! pair. Failures never abort the pipeline: a failed call records a visible
//! error marker as the translation instead.

use crate::config::TranslateConfig;
use crate::lang::{Language, SourceMode};
use crate::ledger::{SessionLedger, TranslationPair};
use crate::live::accumulator::Chunk;
use crate::translate::client::TranslationClient;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, warn};

/// Settings the worker needs from the translate config plus the session
/// source mode.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub mode: SourceMode,
    pub min_chunk_chars: usize,
    pub context_pairs: usize,
}

impl WorkerConfig {
    pub fn new(mode: SourceMode, translate: &TranslateConfig) -> Self {
        Self {
            mode,
            min_chunk_chars: translate.min_chunk_chars,
            context_pairs: translate.context_pairs,
        }
    }
}

/// Translation direction for a source mode: (source description, target).
fn direction(mode: SourceMode) -> (&'static str, &'static str) {
    match mode {
        SourceMode::Bilingual(Language::Korean) => ("Korean", "English"),
        SourceMode::Bilingual(lang) => (lang.name(), "Korean"),
        SourceMode::Mixed => ("the detected source language", "Korean"),
    }
}

/// Build the translation prompt for one chunk.
///
/// Recent pairs are included as `input -> output` lines so terminology and
/// tone stay stable across consecutive chunks.
pub fn build_prompt(context: &[TranslationPair], mode: SourceMode, source_text: &str) -> String {
    let mut prompt = String::new();

    if !context.is_empty() {
        prompt.push_str("Previous translations for context:\n");
        for pair in context {
            prompt.push_str(&format!("- {} -> {}\n", pair.input, pair.output));
        }
        prompt.push('\n');
    }

    let (source, target) = direction(mode);
    prompt.push_str(&format!(
        "This is real-time speech transcription. Translate the following from {} to natural {}.\n\
         Consider the context above for consistent terminology and natural flow.\n\
         Output ONLY the {} translation, nothing else.\n\n{}",
        source, target, target, source_text
    ));
    prompt
}

/// Consumes chunks from the queue, translates them, and appends accepted
/// pairs to the ledger.
pub struct TranslationWorker {
    config: WorkerConfig,
    client: Arc<dyn TranslationClient>,
}

impl TranslationWorker {
    pub fn new(config: WorkerConfig, client: Arc<dyn TranslationClient>) -> Self {
        Self { config, client }
    }

    /// Run until the chunk queue closes or shutdown is signaled.
    ///
    /// On shutdown the queue is drained first: every chunk that made it
    /// into the queue is still translated and persisted before the task
    /// returns. The ledger is shared so it outlives the connection this
    /// worker belongs to.
    pub async fn run(
        self,
        mut chunks: mpsc::Receiver<Chunk>,
        mut shutdown: watch::Receiver<bool>,
        ledger: Arc<Mutex<SessionLedger>>,
    ) {
        loop {
            tokio::select! {
                chunk = chunks.recv() => {
                    match chunk {
                        Some(chunk) => {
                            let mut ledger = ledger.lock().await;
                            self.handle_chunk(&chunk, &mut ledger).await;
                        }
                        None => break,
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped shutdown sender counts as shutdown
                    if changed.is_err() || *shutdown.borrow() {
                        // Drain whatever already entered the queue
                        while let Ok(chunk) = chunks.try_recv() {
                            let mut ledger = ledger.lock().await;
                            self.handle_chunk(&chunk, &mut ledger).await;
                        }
                        break;
                    }
                }
            }
        }
    }

    /// Translate one chunk and record the pair.
    pub async fn handle_chunk(&self, chunk: &Chunk, ledger: &mut SessionLedger) {
        let source_text = chunk.text.trim();

        // Too-short chunks are noise, not errors
        if source_text.chars().count() < self.config.min_chunk_chars {
            debug!(text = source_text, "skipping short chunk");
            return;
        }

        // A buffer made entirely of noise markers or cross-language bleed
        // can still reach a flush; drop it here
        if !self.config.mode.accepts(source_text) {
            debug!(text = source_text, "skipping chunk outside source language");
            return;
        }

        let prompt = build_prompt(
            ledger.context(self.config.context_pairs),
            self.config.mode,
            source_text,
        );

        let translated = match self.client.translate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                // Non-fatal: surface the failure inline and keep going
                warn!("translation call failed: {}", e);
                format!("[translation error: {}]", e)
            }
        };

        println!("{}\n", translated);

        if let Err(e) = ledger.add_pair(source_text, &translated) {
            warn!("ledger append failed: {}", e);
        }
    }
}
