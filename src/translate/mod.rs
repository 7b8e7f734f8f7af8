//! Chunk translation: client seam, prompt assembly, and the worker task.

pub mod client;
pub mod worker;

pub use client::{GeminiTranslator, MockTranslationClient, TranslationClient};
pub use worker::{TranslationWorker, WorkerConfig, build_prompt};
