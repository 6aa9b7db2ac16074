// ABOUTME: Prompts for parsing raw chat exports, alone or combined with reply generation
// ABOUTME: Owns the follow-up vs response perspective instruction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! Conversation parsing prompts.
//!
//! The batched prompt performs parse + reply in one model call, which costs
//! roughly half of separate parse and generate calls.

use crate::models::ToneMode;

/// Build the user-identification rule line shared by both prompts
fn identification_rule(user_identifier: Option<&str>) -> String {
    user_identifier.map_or_else(
        || "Identify who is the user based on context.".to_owned(),
        |name| format!("The user is: \"{name}\""),
    )
}

/// Prompt for standalone conversation parsing of a raw chat export
#[must_use]
pub fn parsing_prompt(user_identifier: Option<&str>) -> String {
    let identification = user_identifier.map_or_else(
        || {
            "- Look for patterns to identify the user (usually appears more frequently \
             or is mentioned in context)"
                .to_owned()
        },
        |name| format!("- The user is: \"{name}\""),
    );

    format!(
        "You are a conversation parser. Your job is to extract and structure messages from \
         chat exports.\n\
         \n\
         IMPORTANT RULES:\n\
         1. Identify who is the user and who is the other person\n\
         2. Skip <Media omitted>, system messages, timestamps without text, and empty messages\n\
         3. Return ONLY valid JSON, no explanatory text\n\
         4. Parse ANY chat format: WhatsApp, Discord, Telegram, SMS, etc.\n\
         \n\
         USER IDENTIFICATION:\n\
         {identification}\n\
         - Everything else is from \"other\" person(s)\n\
         \n\
         EXPECTED OUTPUT FORMAT:\n\
         {{\n\
           \"messages\": [\n\
             {{ \"sender\": \"user\", \"text\": \"message content\" }},\n\
             {{ \"sender\": \"other\", \"text\": \"message content\" }}\n\
           ]\n\
         }}\n\
         \n\
         Parse the conversation and return structured JSON."
    )
}

/// The follow-up perspective instruction, used when the user sent last
const FOLLOW_UP_INSTRUCTION: &str = "The LAST MESSAGE was sent by the USER. Generate follow-up \
     messages to CONTINUE the conversation from the user's side.";

/// The response perspective instruction, used when the other person sent last
const RESPONSE_INSTRUCTION: &str = "The LAST MESSAGE was sent by the OTHER PERSON. Generate \
     replies for the user to RESPOND to them.";

/// Prompt for the combined parse + reply operation
///
/// The perspective switch is computed here, once, from the caller-supplied
/// flag: swapping it silently would produce replies that contradict the
/// conversational direction, so the prompt layer owns the wording on both
/// task statements.
#[must_use]
pub fn batched_prompt(
    conversation_text: &str,
    tone: ToneMode,
    last_message_was_user: bool,
    user_identifier: Option<&str>,
) -> String {
    let perspective = if last_message_was_user {
        FOLLOW_UP_INSTRUCTION
    } else {
        RESPONSE_INSTRUCTION
    };
    let reply_framing = if last_message_was_user {
        "These should be FOLLOW-UP messages that continue what the user just said."
    } else {
        "These should be RESPONSES to what the other person just said."
    };
    let identification = identification_rule(user_identifier);

    format!(
        "You are a dating coach AI assistant. Perform TWO tasks:\n\
         \n\
         TASK 1: PARSE CONVERSATION\n\
         Parse this chat export and identify messages. Skip <Media omitted> and system messages.\n\
         {identification}\n\
         \n\
         CRITICAL: {perspective}\n\
         \n\
         TASK 2: GENERATE REPLIES\n\
         Based on the parsed conversation, generate 3 distinct reply suggestions in {tone} tone.\n\
         {reply_framing}\n\
         \n\
         Tone descriptions:\n\
         - safe: Friendly, respectful, low-risk\n\
         - playful: Light-hearted, fun, subtle humor\n\
         - flirty: Confident, charming, romantic interest\n\
         - bold: Direct, assertive, high-risk high-reward\n\
         \n\
         RESPOND WITH THIS EXACT JSON FORMAT:\n\
         {{\n\
           \"parsed_conversation\": {{\n\
             \"messages\": [\n\
               {{\"sender\": \"user\", \"text\": \"...\"}},\n\
               {{\"sender\": \"other\", \"text\": \"...\"}}\n\
             ]\n\
           }},\n\
           \"replies\": [\n\
             \"First reply suggestion\",\n\
             \"Second reply suggestion\",\n\
             \"Third reply suggestion\"\n\
           ]\n\
         }}\n\
         \n\
         RAW CONVERSATION:\n\
         {conversation_text}\n\
         \n\
         Return ONLY the JSON, no explanatory text."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perspective_switch_is_exclusive() {
        let follow_up = batched_prompt("You: hey", ToneMode::Playful, true, None);
        assert!(follow_up.contains("FOLLOW-UP"));
        assert!(follow_up.contains("sent by the USER"));
        assert!(!follow_up.contains("sent by the OTHER PERSON"));

        let response = batched_prompt("Them: hey", ToneMode::Playful, false, None);
        assert!(response.contains("RESPOND"));
        assert!(response.contains("sent by the OTHER PERSON"));
        assert!(!response.contains("sent by the USER"));
    }

    #[test]
    fn identifier_hint_embedded_when_supplied() {
        let prompt = batched_prompt("June: hi", ToneMode::Safe, false, Some("June"));
        assert!(prompt.contains("The user is: \"June\""));

        let auto = batched_prompt("June: hi", ToneMode::Safe, false, None);
        assert!(auto.contains("Identify who is the user"));
    }

    #[test]
    fn parsing_prompt_lists_skip_rules() {
        let prompt = parsing_prompt(None);
        assert!(prompt.contains("<Media omitted>"));
        assert!(prompt.contains("ONLY valid JSON"));
    }
}
