// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Alert persistence and listener notification.

use chrono::{DateTime, Utc};
use shipwatch_monitor_core::{Alert, AlertId, NewAlert, ShipmentMonitor, TrackingStatus};
use shipwatch_server_db::{AlertRecord, MonitorStore};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::callbacks::CallbackRegistry;
use crate::error::Result;

/// Persists alerts and fans events out to registered listeners.
///
/// Listeners run only after the write they describe has committed.
#[derive(Clone)]
pub struct AlertManager {
	store: Arc<dyn MonitorStore>,
	callbacks: Arc<CallbackRegistry>,
}

impl AlertManager {
	pub fn new(store: Arc<dyn MonitorStore>, callbacks: Arc<CallbackRegistry>) -> Self {
		Self { store, callbacks }
	}

	pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
		&self.callbacks
	}

	/// Record (or extend) the DELAY alert, then notify delay listeners.
	#[instrument(skip(self, monitor, raw, now), fields(tracking_number = %monitor.tracking_number))]
	pub async fn raise_delay(
		&self,
		monitor: &ShipmentMonitor,
		delay_hours: f64,
		raw: &TrackingStatus,
		now: DateTime<Utc>,
	) -> Result<AlertRecord> {
		let record = self
			.store
			.record_alert(&NewAlert::delay(&monitor.tracking_number, delay_hours, now))
			.await?;

		if record.is_created() {
			info!(
				delay_hours = format!("{delay_hours:.1}"),
				severity = %record.alert().severity,
				"shipment delayed"
			);
		}

		self.callbacks.dispatch_delay(monitor, delay_hours, raw);
		Ok(record)
	}

	pub fn notify_status_change(&self, previous: &ShipmentMonitor, raw: &TrackingStatus) {
		info!(
			tracking_number = %previous.tracking_number,
			from = %previous.last_known_status,
			to = %raw.status,
			"status changed"
		);
		self.callbacks.dispatch_status_change(previous, &raw.status, raw);
	}

	pub fn notify_delivery(&self, monitor: &ShipmentMonitor, raw: &TrackingStatus) {
		info!(tracking_number = %monitor.tracking_number, "shipment delivered");
		self.callbacks.dispatch_delivery(monitor, raw);
	}

	pub async fn active_alerts(&self) -> Result<Vec<Alert>> {
		Ok(self.store.list_active_alerts().await?)
	}

	#[instrument(skip(self))]
	pub async fn resolve(&self, id: AlertId) -> Result<Alert> {
		let alert = self.store.resolve_alert(id, Utc::now()).await?;
		info!(tracking_number = %alert.tracking_number, "alert resolved");
		Ok(alert)
	}
}
