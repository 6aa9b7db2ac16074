// ABOUTME: Prompts for conversation context analysis
// ABOUTME: Asks the model for engagement, interest signals, and a tone recommendation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! Context analysis prompts.

use crate::models::{ConversationContext, MessageSender};

/// System prompt for conversation analysis
#[must_use]
pub const fn system_prompt() -> &'static str {
    "You are an expert at analyzing dating and social conversations.\n\
     \n\
     Analyze this conversation and provide insights:\n\
     \n\
     1. Engagement Level (high/medium/low)\n\
     2. Detected Tone and Mood\n\
     3. Interest Signals (positive indicators from them)\n\
     4. Recommended Response Tone (safe/playful/flirty/bold)\n\
     5. Key Notes or Warnings\n\
     \n\
     Be concise and actionable. Focus on helping the user respond effectively."
}

/// Serialize a conversation for analysis, asking for a JSON answer
#[must_use]
pub fn format_conversation(conversation: &ConversationContext) -> String {
    let messages = conversation
        .messages
        .iter()
        .map(|msg| {
            let label = match msg.sender {
                MessageSender::User => "User",
                MessageSender::Other => "Other Person",
            };
            format!("{label}: {}", msg.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let platform = conversation
        .platform
        .as_deref()
        .map(|p| format!("\nPlatform: {p}"))
        .unwrap_or_default();

    format!(
        "Conversation:{platform}\n{messages}\n\n\
         Provide your analysis in JSON format with keys: engagement_level, tone_detected, \
         interest_signals (array), recommended_tone, notes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConversationMessage;

    #[test]
    fn analysis_formatter_labels_speakers() {
        let conversation = ConversationContext {
            messages: vec![
                ConversationMessage::other("haha you're funny"),
                ConversationMessage::user("I try"),
            ],
            platform: Some("tinder".to_owned()),
        };

        let formatted = format_conversation(&conversation);
        assert!(formatted.contains("Platform: tinder"));
        assert!(formatted.contains("Other Person: haha you're funny"));
        assert!(formatted.contains("User: I try"));
        assert!(formatted.contains("engagement_level"));
    }
}
