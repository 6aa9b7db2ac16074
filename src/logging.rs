// ABOUTME: Structured logging setup built on tracing-subscriber
// ABOUTME: EnvFilter-driven levels with pretty or JSON output per environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! Structured, leveled logging for the reply pipeline.
//!
//! Pipeline events (provider attempted, model, outcome) are emitted as
//! `tracing` fields rather than interleaved prints, so observability stays
//! decoupled from control flow.

use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` lines for production log shipping
    Json,
    /// Human-readable output for development
    Pretty,
}

impl LogFormat {
    /// Resolve the format from `LOG_FORMAT` (defaults to pretty)
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Initialize the global tracing subscriber
///
/// Level filtering comes from `RUST_LOG` with an `info` default. Calling
/// this more than once is a no-op error from the subscriber registry, which
/// is swallowed so tests can initialize freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(true))
            .try_init(),
    };

    // Already-initialized is fine (tests, embedded use)
    drop(result);
}
