// ABOUTME: Integration tests for the ordered fallback dispatcher
// ABOUTME: Validates priority order, skip semantics, exhaustion, and timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wingmate_server::errors::{AppError, ErrorCode};
use wingmate_server::llm::{
    ChatRequest, ChatResponse, DispatchParams, FallbackDispatcher, ImageAttachment,
    LlmCapabilities, LlmProvider, ProviderId, ProviderModelPair, ProviderRegistry,
};

// =============================================================================
// Scripted fake provider
// =============================================================================

/// Call log shared between a fake provider and the test
type CallLog = Arc<Mutex<Vec<String>>>;

struct ScriptedProvider {
    name: &'static str,
    capabilities: LlmCapabilities,
    /// Models that fail with an external-service error
    fail_models: Vec<&'static str>,
    /// Models that hang until past any reasonable timeout
    hang_models: Vec<&'static str>,
    response: String,
    calls: CallLog,
}

impl ScriptedProvider {
    fn new(name: &'static str, response: &str, calls: CallLog) -> Self {
        Self {
            name,
            capabilities: LlmCapabilities::full_featured(),
            fail_models: Vec::new(),
            hang_models: Vec::new(),
            response: response.to_owned(),
            calls,
        }
    }

    fn failing_on(mut self, models: Vec<&'static str>) -> Self {
        self.fail_models = models;
        self
    }

    fn hanging_on(mut self, models: Vec<&'static str>) -> Self {
        self.hang_models = models;
        self
    }

    fn text_only(mut self) -> Self {
        self.capabilities = LlmCapabilities::text_only();
        self
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn display_name(&self) -> &'static str {
        "Scripted"
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        "scripted-default"
    }

    fn available_models(&self) -> &'static [&'static str] {
        &["scripted-default"]
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.clone().unwrap_or_default();
        self.calls.lock().unwrap().push(format!("{}/{model}", self.name));

        if self.hang_models.contains(&model.as_str()) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.fail_models.contains(&model.as_str()) {
            return Err(AppError::external_service("scripted", "simulated outage"));
        }

        Ok(ChatResponse {
            content: self.response.clone(),
            model,
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }
}

fn chain(entries: &[(ProviderId, &'static str)]) -> Vec<ProviderModelPair> {
    entries
        .iter()
        .map(|(provider, model)| ProviderModelPair::new(*provider, model))
        .collect()
}

const PARAMS: DispatchParams = DispatchParams {
    temperature: 0.7,
    max_tokens: 100,
};

fn dispatcher_with(
    providers: Vec<ScriptedProvider>,
    text_chain: Vec<ProviderModelPair>,
) -> FallbackDispatcher {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(Box::new(provider));
    }
    let vision_chain = text_chain.clone();
    FallbackDispatcher::with_chains(registry, text_chain, vision_chain, Duration::from_secs(5))
}

// =============================================================================
// Ordered fallback
// =============================================================================

#[tokio::test]
async fn first_success_returns_immediately() {
    let calls: CallLog = Arc::default();
    let dispatcher = dispatcher_with(
        vec![ScriptedProvider::new("gemini", "hello!", calls.clone())],
        chain(&[
            (ProviderId::Gemini, "m1"),
            (ProviderId::Gemini, "m2"),
        ]),
    );

    let outcome = dispatcher.dispatch("system", "user", PARAMS).await.unwrap();

    assert_eq!(outcome.content, "hello!");
    assert_eq!(outcome.provider, ProviderId::Gemini);
    assert_eq!(outcome.model, "m1");
    assert_eq!(calls.lock().unwrap().as_slice(), ["gemini/m1"]);
}

#[tokio::test]
async fn failures_fall_through_in_priority_order() {
    let calls: CallLog = Arc::default();
    let dispatcher = dispatcher_with(
        vec![
            ScriptedProvider::new("gemini", "from gemini", calls.clone())
                .failing_on(vec!["m1", "m2"]),
            ScriptedProvider::new("groq", "from groq", calls.clone()),
        ],
        chain(&[
            (ProviderId::Gemini, "m1"),
            (ProviderId::Gemini, "m2"),
            (ProviderId::Groq, "m3"),
            (ProviderId::Groq, "m4"),
        ]),
    );

    let outcome = dispatcher.dispatch("system", "user", PARAMS).await.unwrap();

    // Providers 1..k fail, provider k+1 answers: exactly k+1 attempts
    assert_eq!(outcome.provider, ProviderId::Groq);
    assert_eq!(outcome.model, "m3");
    assert_eq!(
        calls.lock().unwrap().as_slice(),
        ["gemini/m1", "gemini/m2", "groq/m3"]
    );
}

#[tokio::test]
async fn dispatch_order_is_deterministic() {
    let calls: CallLog = Arc::default();
    let dispatcher = dispatcher_with(
        vec![
            ScriptedProvider::new("gemini", "ok", calls.clone()).failing_on(vec!["m1"]),
            ScriptedProvider::new("groq", "ok", calls.clone()),
        ],
        chain(&[(ProviderId::Gemini, "m1"), (ProviderId::Groq, "m2")]),
    );

    dispatcher.dispatch("s", "u", PARAMS).await.unwrap();
    dispatcher.dispatch("s", "u", PARAMS).await.unwrap();

    assert_eq!(
        calls.lock().unwrap().as_slice(),
        ["gemini/m1", "groq/m2", "gemini/m1", "groq/m2"]
    );
}

// =============================================================================
// Exhaustion and skips
// =============================================================================

#[tokio::test]
async fn all_failures_exhaust_after_exactly_n_attempts() {
    let calls: CallLog = Arc::default();
    let dispatcher = dispatcher_with(
        vec![
            ScriptedProvider::new("gemini", "unused", calls.clone())
                .failing_on(vec!["m1", "m2"]),
            ScriptedProvider::new("groq", "unused", calls.clone()).failing_on(vec!["m3"]),
        ],
        chain(&[
            (ProviderId::Gemini, "m1"),
            (ProviderId::Gemini, "m2"),
            (ProviderId::Groq, "m3"),
        ]),
    );

    let err = dispatcher.dispatch("system", "user", PARAMS).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::AllProvidersExhausted);
    assert_eq!(calls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn unconfigured_provider_is_skipped_not_failed() {
    let calls: CallLog = Arc::default();
    // Only groq is registered; gemini chain entries are skipped silently
    let dispatcher = dispatcher_with(
        vec![ScriptedProvider::new("groq", "groq wins", calls.clone())],
        chain(&[
            (ProviderId::Gemini, "m1"),
            (ProviderId::Gemini, "m2"),
            (ProviderId::Groq, "m3"),
        ]),
    );

    let outcome = dispatcher.dispatch("system", "user", PARAMS).await.unwrap();

    assert_eq!(outcome.provider, ProviderId::Groq);
    assert_eq!(calls.lock().unwrap().as_slice(), ["groq/m3"]);
}

#[tokio::test]
async fn empty_registry_exhausts_without_calls() {
    let dispatcher = dispatcher_with(
        vec![],
        chain(&[(ProviderId::Gemini, "m1"), (ProviderId::Groq, "m2")]),
    );

    let err = dispatcher.dispatch("system", "user", PARAMS).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AllProvidersExhausted);
}

// =============================================================================
// Vision dispatch
// =============================================================================

fn attachment() -> ImageAttachment {
    ImageAttachment {
        data: vec![0xFF, 0xD8, 0xFF, 0xE0],
        mime_type: "image/jpeg".to_owned(),
    }
}

#[tokio::test]
async fn vision_dispatch_skips_text_only_providers() {
    let calls: CallLog = Arc::default();
    let dispatcher = dispatcher_with(
        vec![
            ScriptedProvider::new("gemini", "unused", calls.clone()).text_only(),
            ScriptedProvider::new("groq", "vision answer", calls.clone()),
        ],
        chain(&[(ProviderId::Gemini, "m1"), (ProviderId::Groq, "m2")]),
    );

    let outcome = dispatcher
        .dispatch_vision("system", "user", attachment(), PARAMS)
        .await
        .unwrap();

    assert_eq!(outcome.provider, ProviderId::Groq);
    assert_eq!(calls.lock().unwrap().as_slice(), ["groq/m2"]);
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test]
async fn timed_out_provider_counts_as_failure() {
    let calls: CallLog = Arc::default();
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(
        ScriptedProvider::new("gemini", "slow answer", calls.clone()).hanging_on(vec!["slow"]),
    ));
    registry.register(Box::new(ScriptedProvider::new(
        "groq",
        "fast answer",
        calls.clone(),
    )));

    let text_chain = chain(&[(ProviderId::Gemini, "slow"), (ProviderId::Groq, "fast")]);
    let dispatcher = FallbackDispatcher::with_chains(
        registry,
        text_chain.clone(),
        text_chain,
        Duration::from_millis(100),
    );

    let outcome = dispatcher.dispatch("system", "user", PARAMS).await.unwrap();

    assert_eq!(outcome.content, "fast answer");
    assert_eq!(
        calls.lock().unwrap().as_slice(),
        ["gemini/slow", "groq/fast"]
    );
}
