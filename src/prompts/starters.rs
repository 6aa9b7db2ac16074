// ABOUTME: Prompt for cold-open conversation starter generation
// ABOUTME: Personalizes openers from platform, profile info, and tone
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! Conversation starter prompts.

use crate::models::{StarterOptions, ToneMode};

/// Number of openers requested from the model
pub const STARTER_COUNT: usize = 5;

/// Build the conversation starter prompt
#[must_use]
pub fn starter_prompt(options: &StarterOptions) -> String {
    let platform = options.platform.as_deref().unwrap_or("a dating app");
    let profile_info = options
        .profile_info
        .as_deref()
        .map(|info| format!("\n\nProfile Information:\n{info}"))
        .unwrap_or_default();
    let tone = options.tone.unwrap_or(ToneMode::Playful);

    format!(
        "You are Wingmate, an AI texting copilot.\n\
         \n\
         Generate {STARTER_COUNT} conversation starter messages for {platform}.{profile_info}\n\
         \n\
         Requirements:\n\
         - Tone: {tone}\n\
         - Short and punchy (1-2 sentences max)\n\
         - Specific and personalized (avoid generic \"hey\" or \"hi\")\n\
         - High chance of getting a response\n\
         - Natural and authentic\n\
         \n\
         Provide {STARTER_COUNT} distinct openers, each using a different approach \
         (question, observation, playful tease, shared interest, creative)."
    )
}
