// ABOUTME: Groq LLM provider implementation via the OpenAI-compatible API
// ABOUTME: Fast Llama-family inference with data-URI image input for vision models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Groq Provider
//!
//! Implementation of the [`LlmProvider`] trait for Groq's LPU-accelerated
//! inference.
//!
//! ## Configuration
//!
//! Set the `GROQ_API_KEY` environment variable with your API key from
//! Groq Console: <https://console.groq.com/keys>
//!
//! ## Supported Models
//!
//! - `llama-3.1-8b-instant` (default): fast responses for most requests
//! - `llama-3.1-70b-versatile`: higher quality for complex conversations
//! - `llama-3.2-90b-vision-preview`: vision model for screenshot extraction
//! - `meta-llama/llama-4-scout-17b-16e-instruct`: lighter vision fallback

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{
    ChatMessage, ChatRequest, ChatResponse, ImageAttachment, LlmCapabilities, LlmProvider,
    TokenUsage,
};
use crate::errors::{AppError, ErrorCode};

/// Default model to use
const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Available Groq models
const AVAILABLE_MODELS: &[&str] = &[
    "llama-3.1-8b-instant",
    "llama-3.1-70b-versatile",
    "llama-3.2-90b-vision-preview",
    "meta-llama/llama-4-scout-17b-16e-instruct",
];

/// Base URL for the Groq API (OpenAI-compatible)
const API_BASE_URL: &str = "https://api.groq.com/openai/v1";

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

/// Groq API request structure
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Message structure for the Groq API
#[derive(Debug, Serialize)]
struct GroqMessage {
    role: String,
    content: GroqContent,
}

/// Message content: plain text, or typed parts for vision input
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GroqContent {
    Text(String),
    Parts(Vec<GroqContentPart>),
}

/// Typed content part (OpenAI vision format)
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum GroqContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: GroqImageUrl },
}

/// Image reference carried as a base64 data URI
#[derive(Debug, Serialize)]
struct GroqImageUrl {
    url: String,
}

/// Groq API response structure
#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    #[serde(default)]
    usage: Option<GroqUsage>,
    model: String,
}

/// Choice in a Groq response
#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
    finish_reason: Option<String>,
}

/// Message in a Groq response
#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

/// Usage statistics in a Groq response
#[derive(Debug, Deserialize)]
struct GroqUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

/// Groq API error response
#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: GroqErrorDetail,
}

/// Error detail structure
#[derive(Debug, Deserialize)]
struct GroqErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Groq LLM provider using LPU-accelerated inference
pub struct GroqProvider {
    client: Client,
    api_key: String,
}

impl GroqProvider {
    /// Create a new Groq provider with the given API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Build the API URL for a given endpoint
    fn api_url(endpoint: &str) -> String {
        format!("{API_BASE_URL}/{endpoint}")
    }

    /// Convert internal messages to Groq format
    ///
    /// The image attachment, when present, turns the final user message into
    /// a typed-parts payload with a data-URI image reference.
    fn convert_messages(
        messages: &[ChatMessage],
        attachment: Option<&ImageAttachment>,
    ) -> Vec<GroqMessage> {
        let mut converted: Vec<GroqMessage> = messages
            .iter()
            .map(|msg| GroqMessage {
                role: msg.role.as_str().to_owned(),
                content: GroqContent::Text(msg.content.clone()),
            })
            .collect();

        if let Some(image) = attachment {
            let data_uri = format!(
                "data:{};base64,{}",
                image.mime_type,
                base64::engine::general_purpose::STANDARD.encode(&image.data)
            );
            let image_part = GroqContentPart::ImageUrl {
                image_url: GroqImageUrl { url: data_uri },
            };

            match converted.iter_mut().rev().find(|m| m.role == "user") {
                Some(message) => {
                    let text = match &message.content {
                        GroqContent::Text(t) => t.clone(),
                        GroqContent::Parts(_) => String::new(),
                    };
                    message.content =
                        GroqContent::Parts(vec![GroqContentPart::Text { text }, image_part]);
                }
                None => converted.push(GroqMessage {
                    role: "user".to_owned(),
                    content: GroqContent::Parts(vec![image_part]),
                }),
            }
        }

        converted
    }

    /// Parse an error response body from the Groq API
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        if let Ok(error_response) = serde_json::from_str::<GroqErrorResponse>(body) {
            let error_type = error_response
                .error
                .error_type
                .unwrap_or_else(|| "unknown".to_owned());

            match status.as_u16() {
                401 | 403 => AppError::new(
                    ErrorCode::ExternalAuthFailed,
                    format!(
                        "Groq API authentication failed: {}",
                        error_response.error.message
                    ),
                ),
                429 => AppError::new(
                    ErrorCode::ExternalRateLimited,
                    format!("Groq rate limit exceeded: {}", error_response.error.message),
                ),
                400 => AppError::invalid_input(format!(
                    "Groq API validation error: {}",
                    error_response.error.message
                )),
                _ => AppError::external_service(
                    "Groq",
                    format!("{} - {}", error_type, error_response.error.message),
                ),
            }
        } else {
            AppError::external_service(
                "Groq",
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            )
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn display_name(&self) -> &'static str {
        "Groq (Llama)"
    }

    fn capabilities(&self) -> LlmCapabilities {
        // Vision is available through the llama-3.2 vision model catalog
        LlmCapabilities::full_featured()
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    fn available_models(&self) -> &'static [&'static str] {
        AVAILABLE_MODELS
    }

    #[instrument(skip(self, request), fields(provider = "groq", model = %request.model.as_deref().unwrap_or(DEFAULT_MODEL)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);

        debug!("Sending chat completion request to Groq");

        let groq_request = GroqRequest {
            model: model.to_owned(),
            messages: Self::convert_messages(&request.messages, request.attachment.as_ref()),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(Self::api_url("chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&groq_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to Groq API: {}", e);
                AppError::external_service("Groq", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read Groq API response: {}", e);
            AppError::external_service("Groq", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let groq_response: GroqResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Groq API response: {}", e);
            AppError::external_service("Groq", format!("Failed to parse response: {e}"))
        })?;

        let choice = groq_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("Groq", "API returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();

        debug!(
            chars = content.len(),
            finish_reason = ?choice.finish_reason,
            "Received response from Groq"
        );

        Ok(ChatResponse {
            content,
            model: groq_response.model,
            usage: groq_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt,
                completion_tokens: u.completion,
                total_tokens: u.total,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn plain_messages_stay_textual() {
        let messages = vec![
            ChatMessage::system("be helpful"),
            ChatMessage::user("hello"),
        ];
        let converted = GroqProvider::convert_messages(&messages, None);

        assert_eq!(converted.len(), 2);
        assert!(matches!(converted[0].content, GroqContent::Text(_)));
    }

    #[test]
    fn attachment_becomes_data_uri_part() {
        let messages = vec![ChatMessage::user("read this screenshot")];
        let image = ImageAttachment {
            data: vec![1, 2, 3],
            mime_type: "image/jpeg".to_owned(),
        };
        let converted = GroqProvider::convert_messages(&messages, Some(&image));

        let GroqContent::Parts(parts) = &converted[0].content else {
            panic!("expected typed parts");
        };
        assert_eq!(parts.len(), 2);
        let GroqContentPart::ImageUrl { image_url } = &parts[1] else {
            panic!("expected image part");
        };
        assert!(image_url.url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn auth_errors_mapped() {
        let body = r#"{"error":{"message":"bad key","type":"invalid_request_error"}}"#;
        let err =
            GroqProvider::parse_error_response(reqwest::StatusCode::UNAUTHORIZED, body);
        assert_eq!(err.code, ErrorCode::ExternalAuthFailed);
    }
}
