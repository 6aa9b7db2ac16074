// ABOUTME: SQLite-backed storage for the append-only usage record store
// ABOUTME: Pool setup, idempotent migration, and window-aggregation queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Database Management
//!
//! Persistence for [`crate::models::UsageRecord`] facts. Records are
//! append-only: the quota gate reads rolling-window aggregates and the
//! tracker inserts, nothing ever updates or deletes.

use crate::errors::{AppError, AppResult};
use crate::models::{TypeUsage, UsageRecord};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

/// Database handle for usage storage
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or migration fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains(":memory:")
            && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a migration statement fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS usage_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                request_type TEXT NOT NULL,
                tokens_used INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_usage_records_user_created
             ON usage_records(user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        debug!("usage_records migration complete");
        Ok(())
    }

    /// Append one usage record
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_usage_record(&self, record: &UsageRecord) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO usage_records (user_id, request_type, tokens_used, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(record.user_id.to_string())
        .bind(record.request_type.as_str())
        .bind(record.tokens_used)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert usage record: {e}")))?;

        Ok(())
    }

    /// Count records and sum tokens for a user since a point in time
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn window_usage_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<(i64, i64)> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) as count, COALESCE(SUM(tokens_used), 0) as tokens
            FROM usage_records
            WHERE user_id = $1 AND created_at >= $2
            ",
        )
        .bind(user_id.to_string())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to aggregate usage window: {e}")))?;

        Ok((row.get("count"), row.get("tokens")))
    }

    /// Per-request-type counts for a user since a point in time
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn usage_by_type_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<TypeUsage>> {
        let rows = sqlx::query(
            r"
            SELECT request_type, COUNT(*) as count
            FROM usage_records
            WHERE user_id = $1 AND created_at >= $2
            GROUP BY request_type
            ORDER BY request_type
            ",
        )
        .bind(user_id.to_string())
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to aggregate usage by type: {e}")))?;

        Ok(rows
            .iter()
            .map(|row| TypeUsage {
                request_type: row.get("request_type"),
                count: row.get("count"),
            })
            .collect())
    }

    /// Close the underlying pool (used by tests simulating storage faults)
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
