// ABOUTME: Extraction of typed results from unstructured model output
// ABOUTME: Line-based reply parsing, brace-matched JSON extraction, and degraded fallbacks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Response Parser
//!
//! Three independent extraction strategies, selected by task:
//!
//! 1. **Line-based reply extraction** for reply generation. Never returns an
//!    empty list: when no line survives filtering, a single degraded option
//!    is built from the raw response at lower confidence.
//! 2. **JSON-object extraction** for the batched parse+reply, analysis, and
//!    vision tasks. Models often wrap JSON in prose despite instructions, so
//!    the scan is non-anchored: the first `{` starts a string-aware,
//!    brace-matched span search across the whole response. Shape violations
//!    surface as `INVALID_MODEL_OUTPUT`: silent repair there would
//!    fabricate conversation content.
//! 3. **Synthetic fallback for batched replies**: a well-formed response
//!    carrying zero replies yields exactly one generic acknowledgement at
//!    low confidence, preserving the ≥1-option contract.
//!
//! Confidence values are fixed constants tied to extraction path, a
//! provenance signal for downstream consumers, not a statistical estimate.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::models::{
    ConversationMessage, Platform, ReplyOption, ToneMode, VisionExtraction,
};

/// Confidence for replies extracted cleanly
pub const NORMAL_CONFIDENCE: f64 = 0.8;
/// Confidence for the raw-text single-reply fallback
pub const RAW_FALLBACK_CONFIDENCE: f64 = 0.5;
/// Confidence for the synthetic acknowledgement fallback
pub const SYNTHETIC_FALLBACK_CONFIDENCE: f64 = 0.3;

/// Default confidence for vision extractions missing the field
const VISION_DEFAULT_CONFIDENCE: f64 = 0.8;

/// Lines shorter than this are treated as noise, not replies
const MIN_REPLY_CHARS: usize = 10;

/// Length cap for the raw-text fallback reply
const RAW_FALLBACK_MAX_CHARS: usize = 200;

/// Meta-commentary openers that mark a line as not being a reply
const META_PREFIXES: &[&str] = &["Here are", "Here's"];

/// Text of the synthetic acknowledgement reply
const SYNTHETIC_REPLY_TEXT: &str = "Hey! Thanks for reaching out 😊";

fn numbering_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)] // Safe: compile-time constant pattern
    RE.get_or_init(|| Regex::new(r"^\d+[.):\-]\s*").expect("valid regex"))
}

fn option_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)] // Safe: compile-time constant pattern
    RE.get_or_init(|| Regex::new(r"(?i)^(?:Option|Reply)\s+\d+[:\-]\s*").expect("valid regex"))
}

/// Strip listing decoration like `1.`, `2)`, `Option 1:`, `Reply 3-`
fn strip_listing_prefix(line: &str) -> String {
    let without_number = numbering_regex().replace(line, "");
    option_label_regex()
        .replace(&without_number, "")
        .trim()
        .to_owned()
}

/// Strip a single layer of wrapping quotes
fn strip_wrapping_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Extract reply options from a line-oriented model response
///
/// Collects up to `count` usable lines; requesting more replies than the
/// response contains returns only what survived, never padding. A response
/// with no usable line degrades to one option built from the first
/// [`RAW_FALLBACK_MAX_CHARS`] characters of the raw text at
/// [`RAW_FALLBACK_CONFIDENCE`]; this function never returns an empty list.
#[must_use]
pub fn parse_reply_options(response: &str, tone: ToneMode, count: usize) -> Vec<ReplyOption> {
    let mut replies = Vec::new();

    for line in response.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let cleaned = strip_listing_prefix(line);

        if cleaned.chars().count() < MIN_REPLY_CHARS
            || META_PREFIXES.iter().any(|p| cleaned.starts_with(p))
        {
            continue;
        }

        let text = strip_wrapping_quotes(&cleaned);

        replies.push(ReplyOption {
            text: text.to_owned(),
            tone,
            confidence: NORMAL_CONFIDENCE,
            reasoning: None,
        });

        if replies.len() >= count {
            break;
        }
    }

    if replies.is_empty() {
        debug!("no usable reply lines, degrading to raw-text fallback");
        replies.push(ReplyOption {
            text: response.chars().take(RAW_FALLBACK_MAX_CHARS).collect(),
            tone,
            confidence: RAW_FALLBACK_CONFIDENCE,
            reasoning: None,
        });
    }

    replies.truncate(count.max(1));
    replies
}

/// Locate and parse the first brace-matched JSON object in a response
///
/// The scan starts at the first `{` and tracks string literals and escapes,
/// so braces inside JSON strings don't end the span early.
///
/// # Errors
///
/// Returns `INVALID_MODEL_OUTPUT` when no brace-delimited span exists or
/// the span is not valid JSON.
pub fn extract_json_object(text: &str) -> AppResult<serde_json::Value> {
    let start = text
        .find('{')
        .ok_or_else(|| AppError::invalid_model_output("no JSON object found in response"))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let span = &text[start..=start + offset];
                    return serde_json::from_str(span).map_err(|e| {
                        AppError::invalid_model_output(format!("malformed JSON in response: {e}"))
                    });
                }
            }
            _ => {}
        }
    }

    Err(AppError::invalid_model_output(
        "unterminated JSON object in response",
    ))
}

/// Result of the combined parse + reply extraction
#[derive(Debug, Clone)]
pub struct BatchedExtraction {
    /// Messages recovered from the raw conversation text
    pub messages: Vec<ConversationMessage>,
    /// Generated reply options, at least one
    pub replies: Vec<ReplyOption>,
}

/// Extract the batched parse+reply payload from a model response
///
/// `replies` must be present and a sequence of strings; a missing or
/// mis-shaped key is `INVALID_MODEL_OUTPUT` (callers surface this as a
/// "try again"). An empty sequence is valid and degrades to one synthetic
/// acknowledgement at [`SYNTHETIC_FALLBACK_CONFIDENCE`].
///
/// # Errors
///
/// Returns `INVALID_MODEL_OUTPUT` on missing JSON, a missing or non-array
/// `replies` key, or a `parsed_conversation.messages` that is not a
/// sequence.
pub fn parse_batched_response(
    response: &str,
    tone: ToneMode,
    count: usize,
) -> AppResult<BatchedExtraction> {
    let value = extract_json_object(response)?;

    let reply_values = value
        .get("replies")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| AppError::invalid_model_output("response is missing a replies list"))?;

    let mut replies: Vec<ReplyOption> = reply_values
        .iter()
        .map(|v| {
            v.as_str().map(|text| ReplyOption {
                text: text.to_owned(),
                tone,
                confidence: NORMAL_CONFIDENCE,
                reasoning: None,
            })
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| AppError::invalid_model_output("replies list contains non-string entries"))?;

    let messages = match value.pointer("/parsed_conversation/messages") {
        None => Vec::new(),
        Some(raw) => {
            let entries = raw.as_array().ok_or_else(|| {
                AppError::invalid_model_output("parsed_conversation.messages is not a list")
            })?;
            entries
                .iter()
                .filter_map(|entry| {
                    serde_json::from_value::<ConversationMessage>(entry.clone()).ok()
                })
                .filter(|m| !m.text.trim().is_empty())
                .collect()
        }
    };

    if replies.is_empty() {
        debug!("batched response carried zero replies, synthesizing acknowledgement");
        replies.push(ReplyOption {
            text: SYNTHETIC_REPLY_TEXT.to_owned(),
            tone,
            confidence: SYNTHETIC_FALLBACK_CONFIDENCE,
            reasoning: None,
        });
    }

    replies.truncate(count.max(1));

    Ok(BatchedExtraction { messages, replies })
}

/// Extract a structured conversation from a vision model response
///
/// `messages` must be present and a sequence; `platform` defaults to
/// `unknown` and `confidence` to 0.8 when absent from the model's JSON.
///
/// # Errors
///
/// Returns `INVALID_MODEL_OUTPUT` on missing JSON or a missing/mis-shaped
/// `messages` key.
pub fn parse_vision_response(response: &str) -> AppResult<VisionExtraction> {
    let value = extract_json_object(response)?;

    let entries = value
        .get("messages")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| AppError::invalid_model_output("vision response is missing messages"))?;

    let messages: Vec<ConversationMessage> = entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<ConversationMessage>(entry.clone()).ok())
        .filter(|m| !m.text.trim().is_empty())
        .collect();

    let platform = value
        .get("platform")
        .and_then(serde_json::Value::as_str)
        .map_or(Platform::Unknown, Platform::from_label);

    let confidence = value
        .get("confidence")
        .and_then(serde_json::Value::as_f64)
        .unwrap_or(VISION_DEFAULT_CONFIDENCE);

    Ok(VisionExtraction {
        platform,
        messages,
        confidence,
    })
}

/// Extract the analysis object from a context analysis response
///
/// Tries a whole-response JSON parse first, then the embedded-object scan.
/// Analysis is advisory, so an unparseable response degrades to a text
/// object rather than failing the request.
#[must_use]
pub fn parse_analysis_response(response: &str) -> serde_json::Value {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(response.trim()) {
        if value.is_object() {
            return value;
        }
    }
    extract_json_object(response).unwrap_or_else(|_| {
        debug!("analysis response was not JSON, wrapping as text");
        serde_json::json!({
            "engagement_level": "medium",
            "notes": response,
        })
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn strips_numbering_and_labels() {
        assert_eq!(strip_listing_prefix("1. Hey there friend!"), "Hey there friend!");
        assert_eq!(strip_listing_prefix("2) What's up today?"), "What's up today?");
        assert_eq!(strip_listing_prefix("Option 2: Sounds great"), "Sounds great");
        assert_eq!(strip_listing_prefix("Reply 3- Let's do it"), "Let's do it");
        assert_eq!(strip_listing_prefix("plain line"), "plain line");
    }

    #[test]
    fn strips_one_quote_layer() {
        assert_eq!(strip_wrapping_quotes("\"quoted text\""), "quoted text");
        assert_eq!(strip_wrapping_quotes("'quoted text'"), "quoted text");
        assert_eq!(strip_wrapping_quotes("\"\"double\"\""), "\"double\"");
        assert_eq!(strip_wrapping_quotes("unquoted"), "unquoted");
    }

    #[test]
    fn json_scan_skips_prose_and_braces_in_strings() {
        let response = r#"Sure! Here is the result: {"replies": ["nice {brace} inside"]} hope it helps"#;
        let value = extract_json_object(response).unwrap();
        assert_eq!(value["replies"][0], "nice {brace} inside");
    }

    #[test]
    fn json_scan_fails_without_object() {
        let err = extract_json_object("no json here at all").unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidModelOutput);
    }

    #[test]
    fn analysis_falls_back_to_text() {
        let value = parse_analysis_response("The vibe is good, keep it playful.");
        assert_eq!(value["engagement_level"], "medium");
        assert!(value["notes"].as_str().unwrap().contains("playful"));
    }

    #[test]
    fn analysis_accepts_clean_json() {
        let value = parse_analysis_response(r#"{"engagement_level":"high","notes":"strong"}"#);
        assert_eq!(value["engagement_level"], "high");
    }
}
