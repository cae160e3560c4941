// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The evaluation pipeline shared by poll tasks and webhook ingestion.
//!
//! For one observation: evaluate against the monitor, raise or extend a delay
//! alert, append history, update the persisted monitor (deactivating it on
//! delivery), then notify status-change and delivery listeners.
//!
//! Work on a single shipment is serialized through a per-tracking-number
//! lock so history is appended in observed order. Provider calls happen
//! before the lock is taken; no store call is held open across one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shipwatch_monitor_core::{
	evaluate, Evaluation, MonitorContext, NewHistoryEntry, ShipmentMonitor, TrackingStatus,
};
use shipwatch_server_db::{AlertRecord, MonitorStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, instrument};

use crate::alerts::AlertManager;
use crate::error::Result;
use crate::provider::ProviderRegistry;

/// What processing one observation did.
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutcome {
	pub evaluation: Evaluation,
	/// Present when the observation was delayed.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub alert_id: Option<i64>,
	pub alert_created: bool,
	pub history_id: i64,
	/// False when evaluated against a transient monitor that was not written back.
	pub persisted: bool,
}

/// Result of one poll task.
#[derive(Debug, Clone)]
pub enum PollOutcome {
	Checked(StatusOutcome),
	/// The monitor was removed or delivered while the provider call was in flight.
	Skipped,
}

#[derive(Clone)]
pub struct StatusPipeline {
	store: Arc<dyn MonitorStore>,
	alerts: AlertManager,
	locks: ShipmentLocks,
}

impl StatusPipeline {
	pub fn new(store: Arc<dyn MonitorStore>, alerts: AlertManager) -> Self {
		Self {
			store,
			alerts,
			locks: ShipmentLocks::default(),
		}
	}

	pub fn store(&self) -> &Arc<dyn MonitorStore> {
		&self.store
	}

	pub fn alerts(&self) -> &AlertManager {
		&self.alerts
	}

	/// Fetch fresh status for a persisted monitor and process it.
	#[instrument(skip(self, providers, monitor), fields(tracking_number = %monitor.tracking_number, carrier = %monitor.carrier))]
	pub async fn poll(
		&self,
		providers: &ProviderRegistry,
		monitor: &ShipmentMonitor,
	) -> Result<PollOutcome> {
		let raw = providers
			.track(&monitor.carrier, &monitor.tracking_number)
			.await?;

		let _guard = self.locks.acquire(&monitor.tracking_number).await;

		// Re-read: a webhook may have moved the status on while we were fetching.
		let current = self
			.store
			.get_monitor(&monitor.tracking_number)
			.await?
			.filter(|m| m.active);
		let Some(current) = current else {
			debug!("monitor no longer active, skipping");
			return Ok(PollOutcome::Skipped);
		};

		let outcome = self
			.process(MonitorContext::Persisted(current), raw, Utc::now())
			.await?;
		Ok(PollOutcome::Checked(outcome))
	}

	/// Process a pushed observation.
	///
	/// An active persisted monitor is evaluated and updated. An inactive one is
	/// evaluated but left untouched, and an unknown shipment is evaluated
	/// against `fallback`.
	///
	/// A push without a status carries no status observation: the monitor's
	/// known status stands in for it.
	#[instrument(skip(self, raw, fallback), fields(tracking_number = %raw.tracking_number))]
	pub async fn ingest(
		&self,
		mut raw: TrackingStatus,
		fallback: ShipmentMonitor,
	) -> Result<StatusOutcome> {
		let _guard = self.locks.acquire(&raw.tracking_number).await;

		let context = match self.store.get_monitor(&raw.tracking_number).await? {
			Some(stored) if stored.active => MonitorContext::Persisted(stored),
			Some(stored) => MonitorContext::Transient(stored),
			None => MonitorContext::Transient(fallback),
		};

		if raw.status.trim().is_empty() {
			raw.status = context.monitor().last_known_status.clone();
		}

		self.process(context, raw, Utc::now()).await
	}

	async fn process(
		&self,
		context: MonitorContext,
		raw: TrackingStatus,
		now: DateTime<Utc>,
	) -> Result<StatusOutcome> {
		let monitor = context.monitor();
		let evaluation = evaluate(monitor, &raw, now);
		debug!(?evaluation, status = %raw.status, "evaluated");

		let alert = if evaluation.delayed {
			Some(
				self
					.alerts
					.raise_delay(monitor, evaluation.delay_hours, &raw, now)
					.await?,
			)
		} else {
			None
		};

		let entry = NewHistoryEntry::from_status(&raw, now)?;
		let history_id = self.store.append_history(&entry).await?;

		if context.is_persisted() {
			self
				.store
				.update_monitor_status(&monitor.tracking_number, &raw.status, now, evaluation.delivered)
				.await?;
		}

		if evaluation.transitioned {
			self.alerts.notify_status_change(monitor, &raw);
			if evaluation.delivered {
				self.alerts.notify_delivery(monitor, &raw);
			}
		}

		Ok(StatusOutcome {
			evaluation,
			alert_id: alert.as_ref().map(|a| a.alert().id.0),
			alert_created: alert.as_ref().is_some_and(AlertRecord::is_created),
			history_id,
			persisted: context.is_persisted(),
		})
	}
}

/// One async mutex per tracking number, dropped once nobody holds it.
#[derive(Clone, Default)]
struct ShipmentLocks {
	inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ShipmentLocks {
	async fn acquire(&self, tracking_number: &str) -> OwnedMutexGuard<()> {
		let lock = {
			let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
			map.retain(|_, l| Arc::strong_count(l) > 1);
			map
				.entry(tracking_number.to_string())
				.or_default()
				.clone()
		};
		lock.lock_owned().await
	}
}
