// ABOUTME: System and user prompts for tone-shaped reply generation
// ABOUTME: Embeds tone descriptions and serializes conversations for the model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! Reply generation prompts.

use crate::models::{ConversationContext, MessageSender, ToneMode};

/// Build the system prompt for reply generation
///
/// Embeds the tone's exact description and the tone-specific guidance
/// sentence, plus formatting constraints that keep replies short, specific,
/// and human-sounding.
#[must_use]
pub fn system_prompt(tone: ToneMode, conversation: &ConversationContext) -> String {
    let platform_context = conversation
        .platform
        .as_deref()
        .map(|p| format!("This conversation is from {p}."))
        .unwrap_or_default();

    format!(
        "You are Wingmate, an AI texting copilot specialized in dating and social conversations.\n\
         \n\
         Your task is to analyze the conversation and generate {tone} replies.\n\
         \n\
         Tone: {tone} - {description}\n\
         \n\
         {platform_context}\n\
         \n\
         Guidelines:\n\
         - Generate short, natural replies that someone would actually send\n\
         - Match the conversation's vibe and energy level\n\
         - Keep replies under 2-3 sentences maximum\n\
         - Avoid generic responses - be specific and contextual\n\
         - Sound human, not robotic\n\
         - Consider the flow and timing of messages\n\
         - For {tone} tone, {guidance}\n\
         \n\
         Analyze the conversation and provide 3 distinct reply options, each slightly \
         different in approach but all matching the {tone} tone.",
        description = tone.description(),
        guidance = tone.guidance(),
    )
}

/// Serialize a conversation for the model, labeling "You"/"Them"
///
/// Timestamps, when present, are carried as a ` (timestamp)` suffix on the
/// speaker label.
#[must_use]
pub fn format_conversation(conversation: &ConversationContext) -> String {
    let messages = conversation
        .messages
        .iter()
        .map(|msg| {
            let label = match msg.sender {
                MessageSender::User => "You",
                MessageSender::Other => "Them",
            };
            let timestamp = msg
                .timestamp
                .as_deref()
                .map(|t| format!(" ({t})"))
                .unwrap_or_default();
            format!("{label}{timestamp}: {}", msg.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Conversation:\n{messages}\n\nNow generate 3 reply options:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConversationMessage;

    #[test]
    fn every_tone_description_embedded() {
        let conversation = ConversationContext::new(vec![ConversationMessage::other("hey")]);
        for tone in ToneMode::ALL {
            let prompt = system_prompt(tone, &conversation);
            assert!(prompt.contains(tone.description()), "{tone} description missing");
            assert!(prompt.contains(tone.guidance()), "{tone} guidance missing");
        }
    }

    #[test]
    fn conversation_labels_and_timestamps() {
        let mut message = ConversationMessage::other("Want to grab coffee?");
        message.timestamp = Some("2:14 PM".to_owned());
        let conversation =
            ConversationContext::new(vec![message, ConversationMessage::user("Sure!")]);

        let formatted = format_conversation(&conversation);
        assert!(formatted.contains("Them (2:14 PM): Want to grab coffee?"));
        assert!(formatted.contains("You: Sure!"));
    }
}
