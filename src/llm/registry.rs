// ABOUTME: Provider registry and fixed fallback priority catalogs
// ABOUTME: Maps provider identifiers to configured instances decided at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Provider Registry
//!
//! The registry is built once from configuration and never mutated
//! afterwards. A provider whose credential is absent is simply not
//! registered: the dispatcher treats its chain entries as skips, not
//! failures.
//!
//! Priority catalogs are fixed ordered lists: priority order itself is the
//! retry strategy, so identical inputs explore providers in the same order
//! run to run.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{GeminiProvider, GroqProvider, LlmProvider};
use crate::config::ProviderConfig;

/// Closed set of provider identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    Groq,
}

impl ProviderId {
    /// Stable lowercase identifier matching [`LlmProvider::name`]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Groq => "groq",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a fallback chain
///
/// Identity is the pair: the same model id could in principle appear under
/// two providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderModelPair {
    pub provider: ProviderId,
    pub model: &'static str,
}

impl ProviderModelPair {
    /// Construct a chain entry
    #[must_use]
    pub const fn new(provider: ProviderId, model: &'static str) -> Self {
        Self { provider, model }
    }
}

/// Fallback priority for text generation tasks
#[must_use]
pub fn text_priority() -> Vec<ProviderModelPair> {
    vec![
        ProviderModelPair::new(ProviderId::Gemini, "gemini-2.5-flash"),
        ProviderModelPair::new(ProviderId::Gemini, "gemini-2.5-flash-lite"),
        ProviderModelPair::new(ProviderId::Groq, "llama-3.1-70b-versatile"),
        ProviderModelPair::new(ProviderId::Groq, "llama-3.1-8b-instant"),
    ]
}

/// Fallback priority for vision/screenshot extraction tasks
#[must_use]
pub fn vision_priority() -> Vec<ProviderModelPair> {
    vec![
        ProviderModelPair::new(ProviderId::Gemini, "gemini-2.5-flash"),
        ProviderModelPair::new(ProviderId::Gemini, "gemini-2.5-flash-lite"),
        ProviderModelPair::new(ProviderId::Groq, "llama-3.2-90b-vision-preview"),
        ProviderModelPair::new(
            ProviderId::Groq,
            "meta-llama/llama-4-scout-17b-16e-instruct",
        ),
    ]
}

/// Registry of configured LLM providers
///
/// Lookup is by provider name; unconfigured providers are absent.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn LlmProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Build the registry from provider configuration
    ///
    /// Each provider with a configured credential is instantiated once;
    /// missing credentials silently disable the provider.
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut registry = Self::new();

        if let Some(key) = &config.gemini_api_key {
            registry.register(Box::new(GeminiProvider::new(key.clone())));
        }
        if let Some(key) = &config.groq_api_key {
            registry.register(Box::new(GroqProvider::new(key.clone())));
        }

        registry
    }

    /// Register a provider
    pub fn register(&mut self, provider: Box<dyn LlmProvider>) {
        self.providers.push(provider);
    }

    /// Get a provider by identifier
    #[must_use]
    pub fn get(&self, id: ProviderId) -> Option<&dyn LlmProvider> {
        self.providers
            .iter()
            .find(|p| p.name() == id.as_str())
            .map(AsRef::as_ref)
    }

    /// Names of all configured providers, in registration order
    #[must_use]
    pub fn configured_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Whether any provider is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
