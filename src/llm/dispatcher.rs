// ABOUTME: Ordered fallback dispatch across the configured provider chain
// ABOUTME: One attempt per (provider, model) pair, first success wins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Fallback Dispatcher
//!
//! Dispatches a prompt across an ordered list of (provider, model) pairs,
//! returning the first successful response together with which pair
//! answered.
//!
//! The policy is at-most-one-attempt-per-entry, ordered fallback:
//!
//! - the chain is iterated in fixed priority order, never reordered at
//!   runtime and never in parallel; sequential calls are a deliberate
//!   cost-control choice, since only the first success is kept;
//! - an entry whose provider has no configured credentials is a skip, not a
//!   failure;
//! - any call error (network, auth, provider rejection, timeout) is logged
//!   and the next entry is tried; there is no retry-with-backoff on the
//!   same pair, priority order itself is the retry strategy;
//! - individual provider failures are never exposed to the caller, only the
//!   aggregate exhaustion error.

use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{
    ChatMessage, ChatRequest, ImageAttachment, LlmProvider, ProviderId, ProviderModelPair,
    ProviderRegistry, TokenUsage,
};
use crate::errors::{AppError, AppResult};

/// Sampling parameters for one dispatch
#[derive(Debug, Clone, Copy)]
pub struct DispatchParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Outcome of a successful dispatch
#[derive(Debug, Clone)]
pub struct DispatchSuccess {
    /// Raw response text from the answering model
    pub content: String,
    /// Which provider answered
    pub provider: ProviderId,
    /// Which model answered
    pub model: String,
    /// Token usage as reported by the provider, when available
    pub usage: Option<TokenUsage>,
}

impl DispatchSuccess {
    /// Total tokens reported by the answering provider, 0 when absent
    #[must_use]
    pub fn total_tokens(&self) -> i64 {
        self.usage.as_ref().map_or(0, |u| i64::from(u.total_tokens))
    }
}

/// Dispatcher over an immutable provider chain
pub struct FallbackDispatcher {
    registry: ProviderRegistry,
    text_chain: Vec<ProviderModelPair>,
    vision_chain: Vec<ProviderModelPair>,
    call_timeout: Duration,
}

impl FallbackDispatcher {
    /// Create a dispatcher with the default priority catalogs
    #[must_use]
    pub fn new(registry: ProviderRegistry, call_timeout: Duration) -> Self {
        Self::with_chains(
            registry,
            super::text_priority(),
            super::vision_priority(),
            call_timeout,
        )
    }

    /// Create a dispatcher with explicit priority chains
    ///
    /// The chains are fixed for the dispatcher's lifetime; tests use this to
    /// drive deterministic fake chains.
    #[must_use]
    pub fn with_chains(
        registry: ProviderRegistry,
        text_chain: Vec<ProviderModelPair>,
        vision_chain: Vec<ProviderModelPair>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            text_chain,
            vision_chain,
            call_timeout,
        }
    }

    /// Dispatch a text generation request across the text chain
    ///
    /// # Errors
    ///
    /// Returns `ALL_PROVIDERS_EXHAUSTED` when every chain entry fails or is
    /// unavailable.
    pub async fn dispatch(
        &self,
        system_prompt: &str,
        user_message: &str,
        params: DispatchParams,
    ) -> AppResult<DispatchSuccess> {
        self.run_chain(&self.text_chain, system_prompt, user_message, None, params)
            .await
    }

    /// Dispatch a vision request across the vision chain
    ///
    /// The image is assumed to be already downscaled and re-encoded by the
    /// vision pre-processing contract; it is transmitted as-is. Entries
    /// whose provider lacks the VISION capability are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ALL_PROVIDERS_EXHAUSTED` when every chain entry fails or is
    /// unavailable.
    pub async fn dispatch_vision(
        &self,
        system_prompt: &str,
        user_message: &str,
        image: ImageAttachment,
        params: DispatchParams,
    ) -> AppResult<DispatchSuccess> {
        self.run_chain(
            &self.vision_chain,
            system_prompt,
            user_message,
            Some(image),
            params,
        )
        .await
    }

    /// Iterate a chain in order, returning the first success
    async fn run_chain(
        &self,
        chain: &[ProviderModelPair],
        system_prompt: &str,
        user_message: &str,
        image: Option<ImageAttachment>,
        params: DispatchParams,
    ) -> AppResult<DispatchSuccess> {
        debug!(
            entries = chain.len(),
            temperature = params.temperature,
            max_tokens = params.max_tokens,
            vision = image.is_some(),
            "starting fallback dispatch"
        );

        for pair in chain {
            let Some(provider) = self.registry.get(pair.provider) else {
                debug!(provider = %pair.provider, model = pair.model, "provider not configured, skipping");
                continue;
            };

            if image.is_some() && !provider.capabilities().supports_vision() {
                debug!(provider = %pair.provider, "provider lacks vision capability, skipping");
                continue;
            }

            let mut request = ChatRequest::new(vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_message),
            ])
            .with_model(pair.model)
            .with_temperature(params.temperature)
            .with_max_tokens(params.max_tokens);
            if let Some(attachment) = &image {
                request = request.with_attachment(attachment.clone());
            }

            debug!(provider = %pair.provider, model = pair.model, "attempting provider");

            match timeout(self.call_timeout, provider.complete(&request)).await {
                Ok(Ok(response)) => {
                    info!(
                        provider = %pair.provider,
                        model = pair.model,
                        chars = response.content.len(),
                        "provider answered"
                    );
                    return Ok(DispatchSuccess {
                        content: response.content,
                        provider: pair.provider,
                        model: pair.model.to_owned(),
                        usage: response.usage,
                    });
                }
                Ok(Err(error)) => {
                    warn!(
                        provider = %pair.provider,
                        model = pair.model,
                        %error,
                        "provider failed, falling through"
                    );
                }
                Err(_elapsed) => {
                    warn!(
                        provider = %pair.provider,
                        model = pair.model,
                        timeout_secs = self.call_timeout.as_secs(),
                        "provider timed out, falling through"
                    );
                }
            }
        }

        warn!(entries = chain.len(), "fallback chain exhausted");
        Err(AppError::providers_exhausted(chain.len()))
    }
}
