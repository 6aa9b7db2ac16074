// ABOUTME: Vision OCR system prompt loaded at compile time
// ABOUTME: Speaker-from-layout rules and the strict JSON output contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! Vision extraction prompt.
//!
//! Loaded at compile time from markdown for easy maintenance. The prompt
//! enforces speaker inference from bubble layout (left means other, right means
//! user) and platform classification from a closed enum.

/// Vision OCR system prompt
pub const VISION_SYSTEM_PROMPT: &str = include_str!("vision_system.md");

/// User-message instruction accompanying the screenshot
pub const VISION_USER_MESSAGE: &str =
    "Extract the conversation from this chat screenshot and return the JSON.";

/// Get the vision extraction system prompt
#[must_use]
pub const fn system_prompt() -> &'static str {
    VISION_SYSTEM_PROMPT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_layout_rules() {
        assert!(VISION_SYSTEM_PROMPT.contains("Left-aligned bubbles"));
        assert!(VISION_SYSTEM_PROMPT.contains("Right-aligned bubbles"));
        assert!(VISION_SYSTEM_PROMPT.contains("whatsapp, imessage, discord, telegram, or other"));
        assert!(VISION_SYSTEM_PROMPT.contains("ONLY valid JSON"));
    }
}
