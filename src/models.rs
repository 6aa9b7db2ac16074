// ABOUTME: Core domain types for conversations, tones, replies, and usage tracking
// ABOUTME: Request-scoped pipeline types plus the persistent usage record shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Data Models
//!
//! Domain types shared across the reply generation pipeline. Conversations,
//! reply options, and vision extractions are request-scoped: constructed for
//! one pipeline invocation and discarded. Only [`UsageRecord`] persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of reply suggestions generated per request
pub const DEFAULT_REPLY_COUNT: usize = 3;

// ============================================================================
// Tone
// ============================================================================

/// Closed set of reply styles selectable by the caller
///
/// Each tone maps to a fixed natural-language description embedded verbatim
/// in generated prompts. There are no dynamic tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMode {
    /// Friendly and low-risk
    Safe,
    /// Light-hearted with subtle humor
    Playful,
    /// Confident with clear romantic interest
    Flirty,
    /// Direct and assertive
    Bold,
}

impl ToneMode {
    /// All tone values, in display order
    pub const ALL: [Self; 4] = [Self::Safe, Self::Playful, Self::Flirty, Self::Bold];

    /// Stable lowercase identifier used in prompts and API payloads
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Playful => "playful",
            Self::Flirty => "flirty",
            Self::Bold => "bold",
        }
    }

    /// Fixed description embedded verbatim in system prompts
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Safe => "Friendly, respectful, and low-risk. Good for early conversations.",
            Self::Playful => {
                "Light-hearted, fun, with subtle humor. Shows personality without heavy flirting."
            }
            Self::Flirty => {
                "Confident, charming, with clear romantic interest. Bold but not aggressive."
            }
            Self::Bold => {
                "Direct, assertive, high-risk high-reward. For confident moves and escalation."
            }
        }
    }

    /// Tone-specific phrasing guidance appended to the reply generation prompt
    #[must_use]
    pub const fn guidance(&self) -> &'static str {
        match self {
            Self::Safe => {
                "be friendly and respectful. Avoid anything that could be misinterpreted. \
                 Keep it light and engaging."
            }
            Self::Playful => {
                "add subtle humor and personality. Be fun but not overly forward. \
                 Show interest through lighthearted banter."
            }
            Self::Flirty => {
                "be confident and show clear romantic interest. Use charm and compliments \
                 naturally. Be bold but not aggressive."
            }
            Self::Bold => {
                "be direct and assertive. Make your intentions clear. Take confident risks. \
                 This is for decisive moves."
            }
        }
    }
}

impl std::fmt::Display for ToneMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Conversation
// ============================================================================

/// Who sent a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    /// The person asking for reply suggestions (the phone owner)
    User,
    /// The other participant
    Other,
}

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Who sent the message
    pub sender: MessageSender,
    /// Message text, non-empty after trimming
    pub text: String,
    /// Optional display timestamp, carried through to prompts verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ConversationMessage {
    /// Create a message sent by the user
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: MessageSender::User,
            text: text.into(),
            timestamp: None,
        }
    }

    /// Create a message sent by the other participant
    #[must_use]
    pub fn other(text: impl Into<String>) -> Self {
        Self {
            sender: MessageSender::Other,
            text: text.into(),
            timestamp: None,
        }
    }
}

/// An ordered conversation, immutable for the duration of one pipeline call
///
/// Ordering is chronological and significant: the sender of the last message
/// determines whether generated replies are framed as responses or as
/// follow-ups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Messages in chronological order
    pub messages: Vec<ConversationMessage>,
    /// Optional source platform label (e.g. "whatsapp", "tinder")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl ConversationContext {
    /// Build a conversation from messages with no platform hint
    #[must_use]
    pub fn new(messages: Vec<ConversationMessage>) -> Self {
        Self {
            messages,
            platform: None,
        }
    }

    /// Whether the most recent message was sent by the user
    ///
    /// Empty conversations report `false`: with nothing sent yet, suggested
    /// text is an opener, framed the same way as a response.
    #[must_use]
    pub fn last_message_was_user(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.sender == MessageSender::User)
    }
}

// ============================================================================
// Replies
// ============================================================================

/// One generated reply suggestion
///
/// `confidence` is a provenance constant assigned by the response parser
/// (0.8 normal, 0.5 raw-text fallback, 0.3 synthetic fallback), not a
/// statistical estimate from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyOption {
    pub text: String,
    pub tone: ToneMode,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Request for reply generation
///
/// Exactly one of `conversation` (structured) or `conversation_text` (raw
/// export for the batched parse+reply path) must be set, depending on the
/// operation invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReplyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_text: Option<String>,
    /// Optional display name helping the model identify the user's messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_identifier: Option<String>,
    pub tone: ToneMode,
    /// Requested number of reply options, defaults to [`DEFAULT_REPLY_COUNT`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl GenerateReplyRequest {
    /// The effective reply count for this request
    #[must_use]
    pub fn requested_count(&self) -> usize {
        self.count.unwrap_or(DEFAULT_REPLY_COUNT)
    }
}

/// Conversation insights attached to every reply generation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextAnalysis {
    pub engagement_level: String,
    pub recommended_tone: ToneMode,
    pub notes: String,
}

/// Response from the reply generation operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReplyResponse {
    pub replies: Vec<ReplyOption>,
    pub context_analysis: ContextAnalysis,
}

/// Options for conversation starter generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StarterOptions {
    /// Target platform ("a dating app" when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Free-form profile text to personalize openers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_info: Option<String>,
    /// Desired tone, playful when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<ToneMode>,
}

// ============================================================================
// Vision extraction
// ============================================================================

/// Best-effort chat platform classification from a screenshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Whatsapp,
    Imessage,
    Discord,
    Telegram,
    /// Recognizable chat UI that is none of the named platforms
    Other,
    /// The model did not classify the platform
    Unknown,
}

impl Platform {
    /// Map a model-reported platform label onto the closed enum
    ///
    /// Unrecognized non-empty labels collapse to `Other`; only a missing
    /// label yields `Unknown`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "whatsapp" => Self::Whatsapp,
            "imessage" => Self::Imessage,
            "discord" => Self::Discord,
            "telegram" => Self::Telegram,
            "unknown" | "" => Self::Unknown,
            _ => Self::Other,
        }
    }

    /// Stable lowercase identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::Imessage => "imessage",
            Self::Discord => "discord",
            Self::Telegram => "telegram",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }
}

/// Structured conversation extracted from a chat screenshot by a vision model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionExtraction {
    pub platform: Platform,
    pub messages: Vec<ConversationMessage>,
    pub confidence: f64,
}

impl VisionExtraction {
    /// Whether the most recent extracted message was sent by the user
    #[must_use]
    pub fn last_message_was_user(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.sender == MessageSender::User)
    }
}

/// Vision extraction plus the derived framing flag for downstream callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionOcrResponse {
    pub platform: Platform,
    pub messages: Vec<ConversationMessage>,
    pub confidence: f64,
    /// Decides reply-vs-follow-up framing for a subsequent generation call
    pub last_message_was_user: bool,
}

impl From<VisionExtraction> for VisionOcrResponse {
    fn from(extraction: VisionExtraction) -> Self {
        let last_message_was_user = extraction.last_message_was_user();
        Self {
            platform: extraction.platform,
            messages: extraction.messages,
            confidence: extraction.confidence,
            last_message_was_user,
        }
    }
}

// ============================================================================
// Usage tracking
// ============================================================================

/// Kind of pipeline operation, recorded with every usage event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    ReplyGeneration,
    ConversationAnalysis,
    Ocr,
    ConversationStarter,
}

impl RequestType {
    /// Stable snake_case identifier stored in the usage table
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReplyGeneration => "reply_generation",
            Self::ConversationAnalysis => "conversation_analysis",
            Self::Ocr => "ocr",
            Self::ConversationStarter => "conversation_starter",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only usage fact, never mutated or deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: Uuid,
    pub request_type: RequestType,
    pub tokens_used: i64,
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    /// Build a record for an operation completing now
    #[must_use]
    pub fn now(user_id: Uuid, request_type: RequestType, tokens_used: i64) -> Self {
        Self {
            user_id,
            request_type,
            tokens_used,
            created_at: Utc::now(),
        }
    }
}

/// Aggregated counts for one rolling usage window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowUsage {
    pub count: i64,
    pub tokens: i64,
    pub limit: i64,
}

/// Per-request-type counts over the trailing 30 days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeUsage {
    pub request_type: String,
    pub count: i64,
}

/// Usage statistics for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    pub daily: WindowUsage,
    pub monthly: WindowUsage,
    pub by_type: Vec<TypeUsage>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn tone_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ToneMode::Flirty).unwrap(), "\"flirty\"");
        let tone: ToneMode = serde_json::from_str("\"bold\"").unwrap();
        assert_eq!(tone, ToneMode::Bold);
    }

    #[test]
    fn last_message_framing() {
        let mut conversation = ConversationContext::new(vec![
            ConversationMessage::other("Hey!"),
            ConversationMessage::user("Hi, how are you?"),
        ]);
        assert!(conversation.last_message_was_user());

        conversation
            .messages
            .push(ConversationMessage::other("Good, you?"));
        assert!(!conversation.last_message_was_user());

        assert!(!ConversationContext::default().last_message_was_user());
    }

    #[test]
    fn platform_label_mapping() {
        assert_eq!(Platform::from_label("WhatsApp"), Platform::Whatsapp);
        assert_eq!(Platform::from_label("signal"), Platform::Other);
        assert_eq!(Platform::from_label(""), Platform::Unknown);
        assert_eq!(Platform::from_label("unknown"), Platform::Unknown);
    }

    #[test]
    fn requested_count_defaults() {
        let request = GenerateReplyRequest {
            conversation: None,
            conversation_text: Some("Them: hi".into()),
            user_identifier: None,
            tone: ToneMode::Safe,
            count: None,
        };
        assert_eq!(request.requested_count(), DEFAULT_REPLY_COUNT);
    }
}
