// ABOUTME: Prompt construction for every AI task in the reply pipeline
// ABOUTME: Pure functions from typed inputs to system/user prompt strings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Prompt Builders
//!
//! Pure prompt-construction functions, one submodule per task. No I/O, no
//! failure on valid typed input: given the same conversation, tone, and
//! options, the same prompt strings come back every time.
//!
//! The combined parse+reply prompt owns the perspective decision (follow-up
//! vs. response framing); see [`conversation_parser::batched_prompt`].

pub mod context_analysis;
pub mod conversation_parser;
pub mod reply_generation;
pub mod starters;
pub mod vision;
