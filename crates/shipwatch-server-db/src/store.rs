// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Monitor, history and alert persistence.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use shipwatch_monitor_core::{
	Alert, AlertId, NewAlert, NewHistoryEntry, ShipmentMonitor, StatusHistoryEntry,
};

use crate::error::{DbError, Result};

/// Outcome of [`MonitorStore::record_alert`].
#[derive(Debug, Clone, PartialEq)]
pub enum AlertRecord {
	/// No active alert existed for the shipment and type; this one was inserted.
	Created(Alert),
	/// The already active alert was refreshed in place.
	Extended(Alert),
}

impl AlertRecord {
	pub fn alert(&self) -> &Alert {
		match self {
			Self::Created(a) | Self::Extended(a) => a,
		}
	}

	pub fn is_created(&self) -> bool {
		matches!(self, Self::Created(_))
	}
}

/// Store trait for monitoring state.
///
/// Each call is one statement. Callers must not hold one open across a
/// tracking provider request.
#[async_trait]
pub trait MonitorStore: Send + Sync {
	// Monitors
	/// Insert, or update and reactivate the record with the same tracking number.
	/// The original `created_at` is kept on reactivation.
	async fn upsert_monitor(&self, monitor: &ShipmentMonitor) -> Result<ShipmentMonitor>;
	async fn get_monitor(&self, tracking_number: &str) -> Result<Option<ShipmentMonitor>>;
	/// Soft delete. Returns `false` when no active monitor matched.
	async fn deactivate_monitor(&self, tracking_number: &str) -> Result<bool>;
	/// Active monitors, newest first.
	async fn list_active_monitors(&self) -> Result<Vec<ShipmentMonitor>>;
	/// Record the latest observed status, deactivating the monitor when `deactivate` is set.
	async fn update_monitor_status(
		&self,
		tracking_number: &str,
		status: &str,
		observed_at: DateTime<Utc>,
		deactivate: bool,
	) -> Result<()>;

	// History
	async fn append_history(&self, entry: &NewHistoryEntry) -> Result<i64>;
	/// History for one shipment, most recent first.
	async fn list_history(&self, tracking_number: &str) -> Result<Vec<StatusHistoryEntry>>;

	// Alerts
	/// Insert a new active alert or extend the active one for the same
	/// `(tracking_number, alert_type)`.
	async fn record_alert(&self, alert: &NewAlert) -> Result<AlertRecord>;
	async fn list_active_alerts(&self) -> Result<Vec<Alert>>;
	/// Every alert ever raised for a shipment, newest first.
	async fn list_alerts_for_shipment(&self, tracking_number: &str) -> Result<Vec<Alert>>;
	/// Returns `DbError::NotFound` for unknown or already resolved alerts.
	async fn resolve_alert(&self, id: AlertId, resolved_at: DateTime<Utc>) -> Result<Alert>;
}

/// SQLite implementation of [`MonitorStore`].
#[derive(Clone)]
pub struct SqliteMonitorStore {
	pool: SqlitePool,
}

impl SqliteMonitorStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}
}

const MONITOR_COLUMNS: &str = "tracking_number, carrier, reference, status, last_updated, \
	delay_threshold_hours, check_interval_minutes, callback_url, active, created_at";

const HISTORY_COLUMNS: &str =
	"id, tracking_number, carrier, status, location, timestamp, details, created_at";

const ALERT_COLUMNS: &str = "id, tracking_number, alert_type, message, severity, triggered_at, \
	last_seen_at, resolved_at, active, delay_hours, occurrences";

#[async_trait]
impl MonitorStore for SqliteMonitorStore {
	#[instrument(skip(self, monitor), fields(tracking_number = %monitor.tracking_number, carrier = %monitor.carrier))]
	async fn upsert_monitor(&self, monitor: &ShipmentMonitor) -> Result<ShipmentMonitor> {
		let now = format_ts(Utc::now());
		let sql = format!(
			r#"
			INSERT INTO shipment_monitors (
				tracking_number, carrier, reference, status, last_updated,
				delay_threshold_hours, check_interval_minutes, callback_url,
				active, created_at, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
			ON CONFLICT(tracking_number) DO UPDATE SET
				carrier = excluded.carrier,
				reference = excluded.reference,
				status = CASE WHEN excluded.status = '' THEN shipment_monitors.status ELSE excluded.status END,
				last_updated = COALESCE(excluded.last_updated, shipment_monitors.last_updated),
				delay_threshold_hours = excluded.delay_threshold_hours,
				check_interval_minutes = excluded.check_interval_minutes,
				callback_url = excluded.callback_url,
				active = 1,
				updated_at = excluded.updated_at
			RETURNING {MONITOR_COLUMNS}
			"#
		);

		let row = sqlx::query_as::<_, MonitorRow>(&sql)
			.bind(&monitor.tracking_number)
			.bind(&monitor.carrier)
			.bind(&monitor.reference)
			.bind(&monitor.last_known_status)
			.bind(monitor.last_updated.map(format_ts))
			.bind(monitor.delay_threshold_hours)
			.bind(monitor.check_interval_minutes as i64)
			.bind(&monitor.callback_url)
			.bind(format_ts(monitor.created_at))
			.bind(&now)
			.fetch_one(&self.pool)
			.await?;

		row.try_into()
	}

	#[instrument(skip(self))]
	async fn get_monitor(&self, tracking_number: &str) -> Result<Option<ShipmentMonitor>> {
		let sql = format!("SELECT {MONITOR_COLUMNS} FROM shipment_monitors WHERE tracking_number = ?");
		let row = sqlx::query_as::<_, MonitorRow>(&sql)
			.bind(tracking_number)
			.fetch_optional(&self.pool)
			.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self))]
	async fn deactivate_monitor(&self, tracking_number: &str) -> Result<bool> {
		let result = sqlx::query(
			r#"
			UPDATE shipment_monitors
			SET active = 0, updated_at = ?
			WHERE tracking_number = ? AND active = 1
			"#,
		)
		.bind(format_ts(Utc::now()))
		.bind(tracking_number)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	#[instrument(skip(self))]
	async fn list_active_monitors(&self) -> Result<Vec<ShipmentMonitor>> {
		let sql = format!(
			"SELECT {MONITOR_COLUMNS} FROM shipment_monitors WHERE active = 1 \
			 ORDER BY created_at DESC, tracking_number"
		);
		let rows = sqlx::query_as::<_, MonitorRow>(&sql)
			.fetch_all(&self.pool)
			.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self, observed_at))]
	async fn update_monitor_status(
		&self,
		tracking_number: &str,
		status: &str,
		observed_at: DateTime<Utc>,
		deactivate: bool,
	) -> Result<()> {
		let result = sqlx::query(
			r#"
			UPDATE shipment_monitors
			SET status = ?,
				last_updated = ?,
				active = CASE WHEN ? THEN 0 ELSE active END,
				updated_at = ?
			WHERE tracking_number = ?
			"#,
		)
		.bind(status)
		.bind(format_ts(observed_at))
		.bind(deactivate)
		.bind(format_ts(Utc::now()))
		.bind(tracking_number)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("monitor {tracking_number}")));
		}

		Ok(())
	}

	#[instrument(skip(self, entry), fields(tracking_number = %entry.tracking_number, status = %entry.status))]
	async fn append_history(&self, entry: &NewHistoryEntry) -> Result<i64> {
		let details = serde_json::to_string(&entry.details)?;

		let result = sqlx::query(
			r#"
			INSERT INTO status_history (
				tracking_number, carrier, status, location, timestamp, details, created_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(&entry.tracking_number)
		.bind(&entry.carrier)
		.bind(&entry.status)
		.bind(&entry.location)
		.bind(format_ts(entry.timestamp))
		.bind(details)
		.bind(format_ts(Utc::now()))
		.execute(&self.pool)
		.await?;

		Ok(result.last_insert_rowid())
	}

	#[instrument(skip(self))]
	async fn list_history(&self, tracking_number: &str) -> Result<Vec<StatusHistoryEntry>> {
		let sql = format!(
			"SELECT {HISTORY_COLUMNS} FROM status_history WHERE tracking_number = ? \
			 ORDER BY created_at DESC, id DESC"
		);
		let rows = sqlx::query_as::<_, HistoryRow>(&sql)
			.bind(tracking_number)
			.fetch_all(&self.pool)
			.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self, alert), fields(tracking_number = %alert.tracking_number, alert_type = %alert.alert_type))]
	async fn record_alert(&self, alert: &NewAlert) -> Result<AlertRecord> {
		let triggered_at = format_ts(alert.triggered_at);
		let sql = format!(
			r#"
			INSERT INTO alerts (
				tracking_number, alert_type, message, severity,
				triggered_at, last_seen_at, active, delay_hours, occurrences
			)
			VALUES (?, ?, ?, ?, ?, ?, 1, ?, 1)
			ON CONFLICT(tracking_number, alert_type) WHERE active = 1 DO UPDATE SET
				message = excluded.message,
				severity = excluded.severity,
				last_seen_at = excluded.last_seen_at,
				delay_hours = excluded.delay_hours,
				occurrences = alerts.occurrences + 1
			RETURNING {ALERT_COLUMNS}
			"#
		);

		let row = sqlx::query_as::<_, AlertRow>(&sql)
			.bind(&alert.tracking_number)
			.bind(alert.alert_type.to_string())
			.bind(&alert.message)
			.bind(alert.severity.to_string())
			.bind(&triggered_at)
			.bind(&triggered_at)
			.bind(alert.delay_hours)
			.fetch_one(&self.pool)
			.await?;

		let stored: Alert = row.try_into()?;
		if stored.occurrences <= 1 {
			tracing::info!(alert_id = %stored.id, severity = %stored.severity, "alert raised");
			Ok(AlertRecord::Created(stored))
		} else {
			tracing::debug!(alert_id = %stored.id, occurrences = stored.occurrences, "alert extended");
			Ok(AlertRecord::Extended(stored))
		}
	}

	#[instrument(skip(self))]
	async fn list_active_alerts(&self) -> Result<Vec<Alert>> {
		let sql = format!(
			"SELECT {ALERT_COLUMNS} FROM alerts WHERE active = 1 ORDER BY triggered_at DESC, id DESC"
		);
		let rows = sqlx::query_as::<_, AlertRow>(&sql)
			.fetch_all(&self.pool)
			.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn list_alerts_for_shipment(&self, tracking_number: &str) -> Result<Vec<Alert>> {
		let sql = format!(
			"SELECT {ALERT_COLUMNS} FROM alerts WHERE tracking_number = ? \
			 ORDER BY triggered_at DESC, id DESC"
		);
		let rows = sqlx::query_as::<_, AlertRow>(&sql)
			.bind(tracking_number)
			.fetch_all(&self.pool)
			.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self, resolved_at), fields(alert_id = %id))]
	async fn resolve_alert(&self, id: AlertId, resolved_at: DateTime<Utc>) -> Result<Alert> {
		let sql = format!(
			r#"
			UPDATE alerts
			SET active = 0, resolved_at = ?
			WHERE id = ? AND active = 1
			RETURNING {ALERT_COLUMNS}
			"#
		);

		let row = sqlx::query_as::<_, AlertRow>(&sql)
			.bind(format_ts(resolved_at))
			.bind(id.0)
			.fetch_optional(&self.pool)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("active alert {id}")))?;

		row.try_into()
	}
}

// Fixed-width UTC so text ordering matches time ordering.
fn format_ts(dt: DateTime<Utc>) -> String {
	dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(value: &str, column: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid {column} timestamp {value:?}: {e}")))
}

fn parse_opt_ts(value: Option<String>, column: &str) -> Result<Option<DateTime<Utc>>> {
	value.as_deref().map(|v| parse_ts(v, column)).transpose()
}

#[derive(sqlx::FromRow)]
struct MonitorRow {
	tracking_number: String,
	carrier: String,
	reference: String,
	status: String,
	last_updated: Option<String>,
	delay_threshold_hours: f64,
	check_interval_minutes: i64,
	callback_url: Option<String>,
	active: bool,
	created_at: String,
}

impl TryFrom<MonitorRow> for ShipmentMonitor {
	type Error = DbError;

	fn try_from(row: MonitorRow) -> Result<Self> {
		Ok(ShipmentMonitor {
			tracking_number: row.tracking_number,
			carrier: row.carrier,
			reference: row.reference,
			last_known_status: row.status,
			last_updated: parse_opt_ts(row.last_updated, "last_updated")?,
			delay_threshold_hours: row.delay_threshold_hours,
			check_interval_minutes: u32::try_from(row.check_interval_minutes)
				.map_err(|_| DbError::Internal("invalid check_interval_minutes".to_string()))?,
			callback_url: row.callback_url,
			active: row.active,
			created_at: parse_ts(&row.created_at, "created_at")?,
		})
	}
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
	id: i64,
	tracking_number: String,
	carrier: String,
	status: String,
	location: String,
	timestamp: String,
	details: String,
	created_at: String,
}

impl TryFrom<HistoryRow> for StatusHistoryEntry {
	type Error = DbError;

	fn try_from(row: HistoryRow) -> Result<Self> {
		Ok(StatusHistoryEntry {
			id: row.id,
			tracking_number: row.tracking_number,
			carrier: row.carrier,
			status: row.status,
			location: row.location,
			timestamp: parse_ts(&row.timestamp, "timestamp")?,
			details: serde_json::from_str(&row.details)?,
			created_at: parse_ts(&row.created_at, "created_at")?,
		})
	}
}

#[derive(sqlx::FromRow)]
struct AlertRow {
	id: i64,
	tracking_number: String,
	alert_type: String,
	message: String,
	severity: String,
	triggered_at: String,
	last_seen_at: String,
	resolved_at: Option<String>,
	active: bool,
	delay_hours: Option<f64>,
	occurrences: i64,
}

impl TryFrom<AlertRow> for Alert {
	type Error = DbError;

	fn try_from(row: AlertRow) -> Result<Self> {
		Ok(Alert {
			id: AlertId(row.id),
			tracking_number: row.tracking_number,
			alert_type: row.alert_type.parse()?,
			message: row.message,
			severity: row.severity.parse()?,
			triggered_at: parse_ts(&row.triggered_at, "triggered_at")?,
			last_seen_at: parse_ts(&row.last_seen_at, "last_seen_at")?,
			resolved_at: parse_opt_ts(row.resolved_at, "resolved_at")?,
			active: row.active,
			delay_hours: row.delay_hours,
			occurrences: u32::try_from(row.occurrences).unwrap_or(u32::MAX),
		})
	}
}
