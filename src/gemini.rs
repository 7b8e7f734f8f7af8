//! REST client for Gemini `generateContent` calls.
//!
//! Used for the per-chunk translation requests and the batch file
//! transcription subcommand. The live streaming session has its own
//! WebSocket client in `live::session`.

use crate::error::{ParleyError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inline_data")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

/// Thin client over the generateContent endpoint.
pub struct GeminiClient {
    api_key: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: reqwest::Client::new(),
        }
    }

    /// Read the API key from the environment.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(crate::defaults::API_KEY_ENV).map_err(|_| {
            ParleyError::MissingApiKey {
                env: crate::defaults::API_KEY_ENV.to_string(),
            }
        })?;
        Ok(Self::new(key))
    }

    /// Send a text-only prompt and return the response text.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::Text {
                    text: prompt.to_string(),
                }],
            }],
        };
        self.send(model, &request).await
    }

    /// Send a prompt together with inline audio data.
    pub async fn generate_with_audio(
        &self,
        model: &str,
        prompt: &str,
        mime_type: &str,
        audio: &[u8],
    ) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: BASE64.encode(audio),
                        },
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };
        self.send(model, &request).await
    }

    async fn send(&self, model: &str, request: &GenerateRequest) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, model, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ParleyError::Translation {
                message: format!("request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ParleyError::Translation {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| ParleyError::Translation {
                message: format!("invalid response body: {}", e),
            })?;

        if let Some(feedback) = parsed.prompt_feedback
            && let Some(reason) = feedback.block_reason
        {
            return Err(ParleyError::Translation {
                message: format!("request blocked: {}", reason),
            });
        }

        parsed
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content.parts)
            .and_then(|parts| parts.into_iter().next())
            .and_then(|part| part.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| ParleyError::Translation {
                message: "no text in response".to_string(),
            })
    }
}
