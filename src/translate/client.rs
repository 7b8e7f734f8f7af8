//! Translation client seam.
//!
//! The worker talks to a trait so tests can substitute a mock for the
//! remote model.

use crate::error::{ParleyError, Result};
use crate::gemini::GeminiClient;
use async_trait::async_trait;
use std::sync::Mutex;

/// Trait for the remote translation capability.
///
/// One prompt in, translated text out - no streaming.
#[async_trait]
pub trait TranslationClient: Send + Sync {
    async fn translate(&self, prompt: &str) -> Result<String>;
}

/// Gemini-backed translation client.
pub struct GeminiTranslator {
    client: GeminiClient,
    model: String,
}

impl GeminiTranslator {
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl TranslationClient for GeminiTranslator {
    async fn translate(&self, prompt: &str) -> Result<String> {
        self.client.generate(&self.model, prompt).await
    }
}

/// Mock translation client for testing.
pub struct MockTranslationClient {
    response: String,
    should_fail: bool,
    prompts: Mutex<Vec<String>>,
}

impl MockTranslationClient {
    /// Create a mock that echoes a fixed response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Configure the mock to fail every call.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TranslationClient for MockTranslationClient {
    async fn translate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if self.should_fail {
            Err(ParleyError::Translation {
                message: "mock translation failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }
}
