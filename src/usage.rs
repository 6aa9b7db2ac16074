// ABOUTME: Rolling-window quota gate and best-effort usage tracking
// ABOUTME: Daily and monthly request ceilings over the append-only usage store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Usage Tracking and Quota Gate
//!
//! Quota is a soft, rolling ceiling: the trailing-24h record count is
//! compared against the daily limit, then the trailing-30d count against the
//! monthly limit. The check and a concurrent write from another in-flight
//! request are not transactionally isolated: a user racing two requests
//! near their limit may exceed it by one, which is acceptable for a soft
//! quota.
//!
//! Recording usage is fire-and-forget with respect to the primary response:
//! a storage fault is logged and swallowed, never propagated, because the
//! caller's AI generation has already completed and paid for itself.

use chrono::{Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::UsageConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{RequestType, UsageRecord, UsageStats, WindowUsage};

/// Hours in the daily quota window
const DAILY_WINDOW_HOURS: i64 = 24;

/// Days in the monthly quota window
const MONTHLY_WINDOW_DAYS: i64 = 30;

/// Quota gate and usage recorder for the reply pipeline
#[derive(Clone)]
pub struct UsageTracker {
    database: Database,
    limits: UsageConfig,
}

impl UsageTracker {
    /// Create a tracker over the given store and limits
    #[must_use]
    pub const fn new(database: Database, limits: UsageConfig) -> Self {
        Self { database, limits }
    }

    /// Check whether the user may invoke the pipeline
    ///
    /// The daily window is checked before the monthly window, so whichever
    /// is tighter rejects first.
    ///
    /// # Errors
    ///
    /// Returns `QUOTA_EXCEEDED` naming the violated window, or a database
    /// error if the aggregate queries fail.
    pub async fn check_quota(&self, user_id: Uuid) -> AppResult<()> {
        let now = Utc::now();

        let (daily_count, _) = self
            .database
            .window_usage_since(user_id, now - Duration::hours(DAILY_WINDOW_HOURS))
            .await?;
        if daily_count >= self.limits.daily_limit {
            debug!(%user_id, daily_count, limit = self.limits.daily_limit, "daily quota exceeded");
            return Err(AppError::quota_exceeded("daily", self.limits.daily_limit)
                .with_user_id(user_id));
        }

        let (monthly_count, _) = self
            .database
            .window_usage_since(user_id, now - Duration::days(MONTHLY_WINDOW_DAYS))
            .await?;
        if monthly_count >= self.limits.monthly_limit {
            debug!(%user_id, monthly_count, limit = self.limits.monthly_limit, "monthly quota exceeded");
            return Err(
                AppError::quota_exceeded("monthly", self.limits.monthly_limit)
                    .with_user_id(user_id),
            );
        }

        Ok(())
    }

    /// Record one usage event, best-effort
    ///
    /// Failure is logged and discarded at this call site so that a storage
    /// fault never aborts or rolls back the caller's completed generation.
    pub async fn track_usage(&self, user_id: Uuid, request_type: RequestType, tokens_used: i64) {
        let record = UsageRecord::now(user_id, request_type, tokens_used);
        if let Err(error) = self.database.insert_usage_record(&record).await {
            warn!(%user_id, %request_type, %error, "failed to record usage event");
        }
    }

    /// Usage statistics for one user
    ///
    /// # Errors
    ///
    /// Returns a database error if the aggregate queries fail.
    pub async fn get_user_usage(&self, user_id: Uuid) -> AppResult<UsageStats> {
        let now = Utc::now();
        let daily_since = now - Duration::hours(DAILY_WINDOW_HOURS);
        let monthly_since = now - Duration::days(MONTHLY_WINDOW_DAYS);

        let (daily_count, daily_tokens) =
            self.database.window_usage_since(user_id, daily_since).await?;
        let (monthly_count, monthly_tokens) = self
            .database
            .window_usage_since(user_id, monthly_since)
            .await?;
        let by_type = self
            .database
            .usage_by_type_since(user_id, monthly_since)
            .await?;

        Ok(UsageStats {
            daily: WindowUsage {
                count: daily_count,
                tokens: daily_tokens,
                limit: self.limits.daily_limit,
            },
            monthly: WindowUsage {
                count: monthly_count,
                tokens: monthly_tokens,
                limit: self.limits.monthly_limit,
            },
            by_type,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::errors::ErrorCode;

    async fn tracker_with_limits(daily: i64, monthly: i64) -> UsageTracker {
        let database = Database::new("sqlite::memory:").await.unwrap();
        UsageTracker::new(
            database,
            UsageConfig {
                daily_limit: daily,
                monthly_limit: monthly,
            },
        )
    }

    #[tokio::test]
    async fn quota_allows_under_limit() {
        let tracker = tracker_with_limits(2, 10).await;
        let user = Uuid::new_v4();

        tracker
            .track_usage(user, RequestType::ReplyGeneration, 100)
            .await;
        tracker.check_quota(user).await.unwrap();
    }

    #[tokio::test]
    async fn daily_limit_rejects_before_monthly() {
        let tracker = tracker_with_limits(1, 1000).await;
        let user = Uuid::new_v4();

        tracker
            .track_usage(user, RequestType::ReplyGeneration, 50)
            .await;

        let err = tracker.check_quota(user).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);
        assert!(err.message.contains("daily"));
    }

    #[tokio::test]
    async fn tracking_failure_is_swallowed() {
        let database = Database::new("sqlite::memory:").await.unwrap();
        let tracker = UsageTracker::new(database.clone(), UsageConfig::default());
        database.close().await;

        // Must not panic or surface an error
        tracker
            .track_usage(Uuid::new_v4(), RequestType::Ocr, 0)
            .await;
    }

    #[tokio::test]
    async fn stats_aggregate_by_type() {
        let tracker = tracker_with_limits(50, 1000).await;
        let user = Uuid::new_v4();

        tracker
            .track_usage(user, RequestType::ReplyGeneration, 120)
            .await;
        tracker
            .track_usage(user, RequestType::ConversationAnalysis, 40)
            .await;

        let stats = tracker.get_user_usage(user).await.unwrap();
        assert_eq!(stats.daily.count, 2);
        assert_eq!(stats.daily.tokens, 160);
        assert_eq!(stats.daily.limit, 50);
        assert_eq!(stats.monthly.count, 2);
        assert_eq!(stats.by_type.len(), 2);
    }
}
