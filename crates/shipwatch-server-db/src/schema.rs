// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Idempotent schema setup.

use sqlx::SqlitePool;

use crate::error::Result;

const MIGRATIONS: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS shipment_monitors (
		tracking_number TEXT PRIMARY KEY NOT NULL,
		carrier TEXT NOT NULL,
		reference TEXT NOT NULL DEFAULT '',
		status TEXT NOT NULL DEFAULT '',
		last_updated TEXT,
		delay_threshold_hours REAL NOT NULL,
		check_interval_minutes INTEGER NOT NULL,
		callback_url TEXT,
		active INTEGER NOT NULL DEFAULT 1,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_shipment_monitors_active ON shipment_monitors(active, created_at)",
	// History and alerts may belong to shipments only ever seen through a
	// webhook, so they carry no foreign key to shipment_monitors.
	r#"
	CREATE TABLE IF NOT EXISTS status_history (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		tracking_number TEXT NOT NULL,
		carrier TEXT NOT NULL,
		status TEXT NOT NULL,
		location TEXT NOT NULL DEFAULT '',
		timestamp TEXT NOT NULL,
		details TEXT NOT NULL,
		created_at TEXT NOT NULL
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_status_history_tracking ON status_history(tracking_number, created_at)",
	r#"
	CREATE TABLE IF NOT EXISTS alerts (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		tracking_number TEXT NOT NULL,
		alert_type TEXT NOT NULL,
		message TEXT NOT NULL,
		severity TEXT NOT NULL CHECK (severity IN ('MEDIUM', 'HIGH')),
		triggered_at TEXT NOT NULL,
		last_seen_at TEXT NOT NULL,
		resolved_at TEXT,
		active INTEGER NOT NULL DEFAULT 1,
		delay_hours REAL,
		occurrences INTEGER NOT NULL DEFAULT 1
	)
	"#,
	// At most one active alert per shipment and type.
	r#"
	CREATE UNIQUE INDEX IF NOT EXISTS idx_alerts_one_active
	ON alerts(tracking_number, alert_type) WHERE active = 1
	"#,
	"CREATE INDEX IF NOT EXISTS idx_alerts_active ON alerts(active, triggered_at)",
];

/// Create tables and indexes if they do not exist yet. Safe to run on every start.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	for statement in MIGRATIONS {
		sqlx::query(statement).execute(pool).await?;
	}
	tracing::debug!(statements = MIGRATIONS.len(), "schema up to date");
	Ok(())
}
