// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pool helpers for tests in this and downstream crates.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::Result;
use crate::schema::run_migrations;

/// In-memory database with the full schema.
///
/// Pinned to a single connection: every `:memory:` connection is its own database.
pub async fn create_test_pool() -> Result<SqlitePool> {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await?;
	run_migrations(&pool).await?;
	Ok(pool)
}
