// ABOUTME: Integration tests for the rolling-window quota gate and usage stats
// ABOUTME: Daily-before-monthly ordering and fire-and-forget tracking semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use uuid::Uuid;
use wingmate_server::config::UsageConfig;
use wingmate_server::database::Database;
use wingmate_server::errors::ErrorCode;
use wingmate_server::models::RequestType;
use wingmate_server::usage::UsageTracker;

async fn tracker(daily: i64, monthly: i64) -> UsageTracker {
    let database = Database::new("sqlite::memory:").await.unwrap();
    UsageTracker::new(
        database,
        UsageConfig {
            daily_limit: daily,
            monthly_limit: monthly,
        },
    )
}

// =============================================================================
// Quota windows
// =============================================================================

#[tokio::test]
async fn under_both_limits_passes() {
    let gate = tracker(5, 100).await;
    let user = Uuid::new_v4();

    for _ in 0..4 {
        gate.track_usage(user, RequestType::ReplyGeneration, 10).await;
    }

    gate.check_quota(user).await.unwrap();
}

#[tokio::test]
async fn daily_limit_rejects_even_when_monthly_is_fine() {
    // Monthly limit far from reached; daily limit is the binding constraint
    let gate = tracker(2, 1_000_000).await;
    let user = Uuid::new_v4();

    gate.track_usage(user, RequestType::ReplyGeneration, 10).await;
    gate.track_usage(user, RequestType::ReplyGeneration, 10).await;

    let err = gate.check_quota(user).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::QuotaExceeded);
    assert!(err.message.contains("daily"));
    assert_eq!(err.http_status(), 429);
}

#[tokio::test]
async fn monthly_limit_rejects_when_daily_has_room() {
    // Daily limit generous; monthly limit already consumed
    let gate = tracker(1000, 3).await;
    let user = Uuid::new_v4();

    for _ in 0..3 {
        gate.track_usage(user, RequestType::ConversationAnalysis, 5).await;
    }

    let err = gate.check_quota(user).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::QuotaExceeded);
    assert!(err.message.contains("monthly"));
}

#[tokio::test]
async fn quota_is_per_user() {
    let gate = tracker(1, 10).await;
    let heavy_user = Uuid::new_v4();
    let new_user = Uuid::new_v4();

    gate.track_usage(heavy_user, RequestType::ReplyGeneration, 10)
        .await;

    assert!(gate.check_quota(heavy_user).await.is_err());
    gate.check_quota(new_user).await.unwrap();
}

// =============================================================================
// Tracking semantics
// =============================================================================

#[tokio::test]
async fn tracking_against_dead_store_never_fails() {
    let database = Database::new("sqlite::memory:").await.unwrap();
    let gate = UsageTracker::new(database.clone(), UsageConfig::default());

    database.close().await;

    // A storage fault is logged and swallowed: the call completes normally
    gate.track_usage(Uuid::new_v4(), RequestType::Ocr, 42).await;
}

#[tokio::test]
async fn stats_report_counts_tokens_and_limits() {
    let gate = tracker(50, 1000).await;
    let user = Uuid::new_v4();

    gate.track_usage(user, RequestType::ReplyGeneration, 120).await;
    gate.track_usage(user, RequestType::ReplyGeneration, 30).await;
    gate.track_usage(user, RequestType::Ocr, 0).await;

    let stats = gate.get_user_usage(user).await.unwrap();

    assert_eq!(stats.daily.count, 3);
    assert_eq!(stats.daily.tokens, 150);
    assert_eq!(stats.daily.limit, 50);
    assert_eq!(stats.monthly.count, 3);
    assert_eq!(stats.monthly.limit, 1000);

    let reply_row = stats
        .by_type
        .iter()
        .find(|t| t.request_type == "reply_generation")
        .unwrap();
    assert_eq!(reply_row.count, 2);
    let ocr_row = stats.by_type.iter().find(|t| t.request_type == "ocr").unwrap();
    assert_eq!(ocr_row.count, 1);
}

#[tokio::test]
async fn fresh_user_has_empty_stats() {
    let gate = tracker(50, 1000).await;
    let stats = gate.get_user_usage(Uuid::new_v4()).await.unwrap();

    assert_eq!(stats.daily.count, 0);
    assert_eq!(stats.monthly.tokens, 0);
    assert!(stats.by_type.is_empty());
}
