// ABOUTME: Main library entry point for the Wingmate reply suggestion backend
// ABOUTME: Multi-provider AI orchestration with fallback, parsing, and quota gating
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

#![deny(unsafe_code)]

//! # Wingmate Server
//!
//! A backend that turns a chat conversation (typed or derived from a
//! screenshot) into AI-generated reply suggestions, tuned to a selectable
//! tone.
//!
//! The core is a multi-provider orchestration pipeline: task-specific
//! prompts are dispatched across an ordered list of interchangeable model
//! providers with automatic fallback, model output is parsed into strict
//! typed results, and a rolling per-user quota gates access.
//!
//! ## Architecture
//!
//! - **`prompts`**: Pure prompt builders, one submodule per task
//! - **`llm`**: Provider SPI, Gemini/Groq implementations, registry, and
//!   the ordered fallback dispatcher
//! - **`parser`**: Typed extraction from unstructured model output with
//!   documented degraded fallbacks
//! - **`usage`**: Rolling daily/monthly quota gate over the persistent
//!   usage store
//! - **`vision`**: Screenshot downscaling and vision-model conversation
//!   extraction
//! - **`service`**: The orchestrating pipeline consumed by the (external)
//!   HTTP layer
//!
//! ## Example
//!
//! ```rust,no_run
//! use wingmate_server::config::ServerConfig;
//! use wingmate_server::database::Database;
//! use wingmate_server::llm::{FallbackDispatcher, ProviderRegistry};
//! use wingmate_server::service::ReplyService;
//! use wingmate_server::usage::UsageTracker;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     wingmate_server::logging::init();
//!
//!     let config = ServerConfig::from_env()?;
//!     config.validate()?;
//!
//!     let database = Database::new(&config.database.url).await?;
//!     let registry = ProviderRegistry::from_config(&config.providers);
//!     let dispatcher = FallbackDispatcher::new(registry, config.dispatch.call_timeout);
//!     let usage = UsageTracker::new(database, config.usage);
//!
//!     let _service = ReplyService::new(dispatcher, usage);
//!     Ok(())
//! }
//! ```

/// Environment-based configuration loaded once at startup
pub mod config;

/// `SQLite`-backed storage for the append-only usage store
pub mod database;

/// Unified error codes and the application error type
pub mod errors;

/// LLM provider abstraction, implementations, registry, and dispatcher
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Core domain types
pub mod models;

/// Extraction of typed results from model output
pub mod parser;

/// Prompt construction for every AI task
pub mod prompts;

/// The orchestrating reply pipeline
pub mod service;

/// Quota gate and best-effort usage tracking
pub mod usage;

/// Screenshot-to-conversation vision extraction
pub mod vision;
