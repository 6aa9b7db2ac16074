// ABOUTME: Orchestration of the reply pipeline: quota, prompts, dispatch, parsing
// ABOUTME: One entry point per AI operation, usage recorded best-effort after success
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Reply Service
//!
//! The pipeline for every operation is: quota pre-check → prompt builder →
//! fallback dispatch → response parse → best-effort usage record → result.
//! Input validation happens before any provider call is attempted, to avoid
//! wasted cost.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::llm::{DispatchParams, FallbackDispatcher};
use crate::models::{
    ContextAnalysis, ConversationContext, GenerateReplyRequest, GenerateReplyResponse,
    ReplyOption, RequestType, StarterOptions, UsageStats, VisionOcrResponse,
};
use crate::parser;
use crate::prompts;
use crate::usage::UsageTracker;
use crate::vision;

/// Sampling for reply generation: higher creativity for diverse replies
const REPLY_PARAMS: DispatchParams = DispatchParams {
    temperature: 0.8,
    max_tokens: 500,
};

/// Sampling for the batched parse+reply call: balanced temperature, enough
/// tokens for parsing plus replies
const BATCHED_PARAMS: DispatchParams = DispatchParams {
    temperature: 0.7,
    max_tokens: 800,
};

/// Sampling for context analysis: lower temperature for factual output
const ANALYSIS_PARAMS: DispatchParams = DispatchParams {
    temperature: 0.3,
    max_tokens: 400,
};

/// Sampling for conversation starters
const STARTER_PARAMS: DispatchParams = DispatchParams {
    temperature: 0.8,
    max_tokens: 400,
};

/// Neutral system prompt for the batched operation, whose instructions live
/// in the user message
const BATCHED_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Orchestrator for the AI reply pipeline
pub struct ReplyService {
    dispatcher: FallbackDispatcher,
    usage: UsageTracker,
}

impl ReplyService {
    /// Create a service over a configured dispatcher and usage tracker
    #[must_use]
    pub const fn new(dispatcher: FallbackDispatcher, usage: UsageTracker) -> Self {
        Self { dispatcher, usage }
    }

    /// Generate reply suggestions for a structured conversation
    ///
    /// # Errors
    ///
    /// Returns `QUOTA_EXCEEDED` when a usage window is full,
    /// `MISSING_REQUIRED_FIELD` when no conversation is supplied, and
    /// `ALL_PROVIDERS_EXHAUSTED` when no provider answers.
    #[instrument(skip(self, request), fields(%user_id, tone = %request.tone))]
    pub async fn generate_replies(
        &self,
        user_id: Uuid,
        request: &GenerateReplyRequest,
    ) -> AppResult<GenerateReplyResponse> {
        self.usage.check_quota(user_id).await?;

        let conversation = request
            .conversation
            .as_ref()
            .ok_or_else(|| AppError::missing_field("conversation"))?;
        if conversation.messages.is_empty() {
            return Err(AppError::invalid_input("conversation has no messages"));
        }

        let system_prompt = prompts::reply_generation::system_prompt(request.tone, conversation);
        let user_message = prompts::reply_generation::format_conversation(conversation);

        let outcome = self
            .dispatcher
            .dispatch(&system_prompt, &user_message, REPLY_PARAMS)
            .await?;

        let replies =
            parser::parse_reply_options(&outcome.content, request.tone, request.requested_count());

        info!(
            provider = %outcome.provider,
            model = %outcome.model,
            replies = replies.len(),
            "reply generation complete"
        );

        self.usage
            .track_usage(user_id, RequestType::ReplyGeneration, outcome.total_tokens())
            .await;

        Ok(GenerateReplyResponse {
            replies,
            context_analysis: ContextAnalysis {
                engagement_level: "medium".to_owned(),
                recommended_tone: request.tone,
                notes: format!("Generated by {}/{}", outcome.provider, outcome.model),
            },
        })
    }

    /// Parse a raw conversation export and generate replies in one model call
    ///
    /// Batching roughly halves API cost compared to separate parse and
    /// generate calls. When the caller already knows the last sender (e.g.
    /// downstream of vision extraction) the structured hint decides the
    /// follow-up vs response framing; plain raw text defaults to responses.
    ///
    /// # Errors
    ///
    /// Returns `QUOTA_EXCEEDED`, `MISSING_REQUIRED_FIELD` when no raw text
    /// is supplied, `ALL_PROVIDERS_EXHAUSTED`, or `INVALID_MODEL_OUTPUT`
    /// when the model's JSON cannot be validated (a user-facing "try
    /// again").
    #[instrument(skip(self, request), fields(%user_id, tone = %request.tone))]
    pub async fn parse_and_generate_replies(
        &self,
        user_id: Uuid,
        request: &GenerateReplyRequest,
    ) -> AppResult<GenerateReplyResponse> {
        self.usage.check_quota(user_id).await?;

        let conversation_text = request
            .conversation_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::missing_field("conversation_text"))?;

        let last_message_was_user = request
            .conversation
            .as_ref()
            .is_some_and(ConversationContext::last_message_was_user);

        let user_message = prompts::conversation_parser::batched_prompt(
            conversation_text,
            request.tone,
            last_message_was_user,
            request.user_identifier.as_deref(),
        );

        let outcome = self
            .dispatcher
            .dispatch(BATCHED_SYSTEM_PROMPT, &user_message, BATCHED_PARAMS)
            .await?;

        let extraction = parser::parse_batched_response(
            &outcome.content,
            request.tone,
            request.requested_count(),
        )?;

        info!(
            provider = %outcome.provider,
            model = %outcome.model,
            parsed_messages = extraction.messages.len(),
            replies = extraction.replies.len(),
            "batched parse and reply complete"
        );

        self.usage
            .track_usage(user_id, RequestType::ReplyGeneration, outcome.total_tokens())
            .await;

        Ok(GenerateReplyResponse {
            context_analysis: ContextAnalysis {
                engagement_level: "medium".to_owned(),
                recommended_tone: request.tone,
                notes: format!(
                    "Batched operation by {}/{}. Parsed {} messages.",
                    outcome.provider,
                    outcome.model,
                    extraction.messages.len()
                ),
            },
            replies: extraction.replies,
        })
    }

    /// Analyze conversation context and return model insights
    ///
    /// # Errors
    ///
    /// Returns `QUOTA_EXCEEDED`, `INVALID_INPUT` for an empty conversation,
    /// or `ALL_PROVIDERS_EXHAUSTED`.
    #[instrument(skip(self, conversation), fields(%user_id))]
    pub async fn analyze_conversation(
        &self,
        user_id: Uuid,
        conversation: &ConversationContext,
    ) -> AppResult<serde_json::Value> {
        self.usage.check_quota(user_id).await?;

        if conversation.messages.is_empty() {
            return Err(AppError::invalid_input("conversation has no messages"));
        }

        let system_prompt = prompts::context_analysis::system_prompt();
        let user_message = prompts::context_analysis::format_conversation(conversation);

        let outcome = self
            .dispatcher
            .dispatch(system_prompt, &user_message, ANALYSIS_PARAMS)
            .await?;

        let analysis = parser::parse_analysis_response(&outcome.content);

        info!(provider = %outcome.provider, model = %outcome.model, "analysis complete");

        self.usage
            .track_usage(
                user_id,
                RequestType::ConversationAnalysis,
                outcome.total_tokens(),
            )
            .await;

        Ok(analysis)
    }

    /// Generate cold-open conversation starters
    ///
    /// # Errors
    ///
    /// Returns `QUOTA_EXCEEDED` or `ALL_PROVIDERS_EXHAUSTED`.
    #[instrument(skip(self, options), fields(%user_id))]
    pub async fn generate_starters(
        &self,
        user_id: Uuid,
        options: &StarterOptions,
    ) -> AppResult<Vec<ReplyOption>> {
        self.usage.check_quota(user_id).await?;

        let tone = options.tone.unwrap_or(crate::models::ToneMode::Playful);
        let user_message = prompts::starters::starter_prompt(options);

        let outcome = self
            .dispatcher
            .dispatch(BATCHED_SYSTEM_PROMPT, &user_message, STARTER_PARAMS)
            .await?;

        let starters = parser::parse_reply_options(
            &outcome.content,
            tone,
            prompts::starters::STARTER_COUNT,
        );

        info!(
            provider = %outcome.provider,
            model = %outcome.model,
            starters = starters.len(),
            "starter generation complete"
        );

        self.usage
            .track_usage(
                user_id,
                RequestType::ConversationStarter,
                outcome.total_tokens(),
            )
            .await;

        Ok(starters)
    }

    /// Extract a structured conversation from a chat screenshot
    ///
    /// Returns the extraction plus the derived `last_message_was_user` flag
    /// so the caller can choose reply-vs-follow-up framing downstream.
    ///
    /// # Errors
    ///
    /// Returns `QUOTA_EXCEEDED`, `INVALID_INPUT` for undecodable images,
    /// `ALL_PROVIDERS_EXHAUSTED`, or `INVALID_MODEL_OUTPUT`.
    #[instrument(skip(self, image_bytes), fields(%user_id, image_bytes = image_bytes.len()))]
    pub async fn extract_from_screenshot(
        &self,
        user_id: Uuid,
        image_bytes: &[u8],
    ) -> AppResult<VisionOcrResponse> {
        self.usage.check_quota(user_id).await?;

        let (extraction, outcome) =
            vision::extract_conversation(&self.dispatcher, image_bytes).await?;

        info!(
            provider = %outcome.provider,
            model = %outcome.model,
            platform = extraction.platform.as_str(),
            messages = extraction.messages.len(),
            "screenshot extraction complete"
        );

        self.usage
            .track_usage(user_id, RequestType::Ocr, outcome.total_tokens())
            .await;

        Ok(VisionOcrResponse::from(extraction))
    }

    /// Usage statistics for one user
    ///
    /// # Errors
    ///
    /// Returns a database error if the aggregate queries fail.
    pub async fn usage_stats(&self, user_id: Uuid) -> AppResult<UsageStats> {
        self.usage.get_user_usage(user_id).await
    }
}
