// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Control plane for the monitoring engine.

use serde::Serialize;
use shipwatch_monitor_core::{
	Alert, AlertId, ShipmentMonitor, StatusHistoryEntry, TrackingStatus,
	DEFAULT_CHECK_INTERVAL_MINUTES, DEFAULT_DELAY_THRESHOLD_HOURS,
};
use shipwatch_server_db::MonitorStore;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::alerts::AlertManager;
use crate::callbacks::CallbackRegistry;
use crate::error::{MonitorError, Result};
use crate::pipeline::{StatusOutcome, StatusPipeline};
use crate::provider::ProviderRegistry;
use crate::scheduler::{CycleReport, PollScheduler, SchedulerSettings};
use crate::webhook::WebhookPayload;

#[derive(Debug, Clone)]
pub struct EngineSettings {
	pub scheduler: SchedulerSettings,
	/// Applied to monitors created without an explicit threshold and to
	/// webhook pushes for unmonitored shipments.
	pub default_delay_threshold_hours: f64,
	pub default_check_interval_minutes: u32,
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			scheduler: SchedulerSettings::default(),
			default_delay_threshold_hours: DEFAULT_DELAY_THRESHOLD_HOURS,
			default_check_interval_minutes: DEFAULT_CHECK_INTERVAL_MINUTES,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
	pub running: bool,
	pub active_monitors: usize,
	pub carriers: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_cycle: Option<CycleReport>,
}

/// One monitoring engine: store, providers, listeners and the poll loop.
///
/// Listener lists belong to the instance. Construct one per process and share
/// it behind an `Arc`.
pub struct MonitorEngine {
	pipeline: StatusPipeline,
	scheduler: PollScheduler,
	providers: Arc<ProviderRegistry>,
	callbacks: Arc<CallbackRegistry>,
	settings: EngineSettings,
}

impl MonitorEngine {
	pub fn new(
		store: Arc<dyn MonitorStore>,
		providers: ProviderRegistry,
		settings: EngineSettings,
	) -> Self {
		let callbacks = Arc::new(CallbackRegistry::new());
		let alerts = AlertManager::new(Arc::clone(&store), Arc::clone(&callbacks));
		let pipeline = StatusPipeline::new(store, alerts);
		let providers = Arc::new(providers);
		let scheduler = PollScheduler::new(
			pipeline.clone(),
			Arc::clone(&providers),
			settings.scheduler.clone(),
		);

		Self {
			pipeline,
			scheduler,
			providers,
			callbacks,
			settings,
		}
	}

	pub fn settings(&self) -> &EngineSettings {
		&self.settings
	}

	pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
		&self.callbacks
	}

	pub fn register_delay_callback<F>(&self, callback: F)
	where
		F: Fn(&ShipmentMonitor, f64, &TrackingStatus) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.callbacks.register_delay(callback);
	}

	pub fn register_status_change_callback<F>(&self, callback: F)
	where
		F: Fn(&ShipmentMonitor, &str, &TrackingStatus) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.callbacks.register_status_change(callback);
	}

	pub fn register_delivery_callback<F>(&self, callback: F)
	where
		F: Fn(&ShipmentMonitor, &TrackingStatus) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.callbacks.register_delivery(callback);
	}

	// Lifecycle

	pub async fn start(&self) -> Result<()> {
		self.scheduler.start().await?;
		info!("monitoring started");
		Ok(())
	}

	pub async fn stop(&self) -> Result<()> {
		self.scheduler.stop().await?;
		info!("monitoring stopped");
		Ok(())
	}

	pub async fn is_running(&self) -> bool {
		self.scheduler.is_running().await
	}

	/// Poll every active monitor once, now.
	pub async fn run_cycle(&self) -> Result<CycleReport> {
		self.scheduler.run_once().await
	}

	pub async fn status(&self) -> Result<EngineStatus> {
		Ok(EngineStatus {
			running: self.is_running().await,
			active_monitors: self.pipeline.store().list_active_monitors().await?.len(),
			carriers: self.providers.carriers(),
			last_cycle: self.scheduler.last_cycle(),
		})
	}

	// Monitors

	/// A new monitor carrying this engine's default SLA settings.
	pub fn new_monitor(
		&self,
		tracking_number: impl Into<String>,
		carrier: impl Into<String>,
	) -> ShipmentMonitor {
		ShipmentMonitor::new(tracking_number, carrier)
			.with_delay_threshold_hours(self.settings.default_delay_threshold_hours)
			.with_check_interval_minutes(self.settings.default_check_interval_minutes)
	}

	/// Start monitoring a shipment, reactivating it if it was monitored before.
	#[instrument(skip(self, monitor), fields(tracking_number = %monitor.tracking_number))]
	pub async fn add_monitor(&self, mut monitor: ShipmentMonitor) -> Result<ShipmentMonitor> {
		monitor.tracking_number = monitor.tracking_number.trim().to_string();
		monitor.validate()?;
		if monitor.carrier.trim().is_empty() {
			return Err(MonitorError::Validation("missing carrier".to_string()));
		}
		if !monitor.delay_threshold_hours.is_finite() || monitor.delay_threshold_hours < 0.0 {
			return Err(MonitorError::Validation(
				"delay threshold must be a non-negative number of hours".to_string(),
			));
		}
		if monitor.check_interval_minutes == 0 {
			return Err(MonitorError::Validation(
				"check interval must be at least one minute".to_string(),
			));
		}

		let stored = self.pipeline.store().upsert_monitor(&monitor).await?;
		info!(carrier = %stored.carrier, "monitor added");
		Ok(stored)
	}

	/// Stop monitoring a shipment. Returns `false` if it was not being monitored.
	#[instrument(skip(self))]
	pub async fn remove_monitor(&self, tracking_number: &str) -> Result<bool> {
		let removed = self.pipeline.store().deactivate_monitor(tracking_number).await?;
		if removed {
			info!("monitor removed");
		}
		Ok(removed)
	}

	pub async fn get_monitor(&self, tracking_number: &str) -> Result<Option<ShipmentMonitor>> {
		Ok(self.pipeline.store().get_monitor(tracking_number).await?)
	}

	pub async fn list_active_monitors(&self) -> Result<Vec<ShipmentMonitor>> {
		Ok(self.pipeline.store().list_active_monitors().await?)
	}

	pub async fn get_shipment_history(
		&self,
		tracking_number: &str,
	) -> Result<Vec<StatusHistoryEntry>> {
		Ok(self.pipeline.store().list_history(tracking_number).await?)
	}

	// Alerts

	pub async fn get_active_alerts(&self) -> Result<Vec<Alert>> {
		self.pipeline.alerts().active_alerts().await
	}

	pub async fn get_shipment_alerts(&self, tracking_number: &str) -> Result<Vec<Alert>> {
		Ok(self
			.pipeline
			.store()
			.list_alerts_for_shipment(tracking_number)
			.await?)
	}

	pub async fn resolve_alert(&self, id: AlertId) -> Result<Alert> {
		self.pipeline.alerts().resolve(id).await
	}

	// Webhooks

	/// Process a carrier push on the caller's task. Writes nothing when the
	/// payload has no tracking number.
	pub async fn handle_webhook(&self, payload: WebhookPayload) -> Result<StatusOutcome> {
		let (raw, fallback) = payload.into_observation(self.settings.default_delay_threshold_hours)?;
		self.pipeline.ingest(raw, fallback).await
	}
}
