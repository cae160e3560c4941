// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build a [`MonitorEngine`] from resolved configuration.

use anyhow::Context;
use shipwatch_server_config::{CarrierConfig, MonitorConfig, ServerConfig};
use shipwatch_server_db::SqliteMonitorStore;
use shipwatch_server_monitor::{
	CallbackUrlNotifier, EngineSettings, HttpTrackingProvider, MonitorEngine, ProviderError,
	ProviderRegistry, SchedulerSettings,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

pub fn engine_settings(monitor: &MonitorConfig) -> EngineSettings {
	EngineSettings {
		scheduler: SchedulerSettings {
			interval: monitor.interval(),
			max_workers: monitor.max_workers,
			task_timeout: monitor.task_timeout(),
			shutdown_grace: monitor.shutdown_grace(),
			error_backoff: monitor.error_backoff(),
		},
		default_delay_threshold_hours: monitor.delay_threshold_hours,
		default_check_interval_minutes: monitor.check_interval_minutes,
	}
}

pub fn build_providers(carriers: &[CarrierConfig]) -> Result<ProviderRegistry, ProviderError> {
	let mut registry = ProviderRegistry::new();
	for carrier in carriers {
		let provider = HttpTrackingProvider::new(
			&carrier.name,
			&carrier.base_url,
			carrier.api_key.clone(),
			carrier.timeout(),
		)?;
		info!(carrier = %carrier.name, base_url = %carrier.base_url, "registered tracking provider");
		registry.register(Arc::new(provider));
	}
	Ok(registry)
}

/// Engine with HTTP providers for every configured carrier and the
/// callback-URL notifier attached.
pub fn build_engine(config: &ServerConfig, pool: SqlitePool) -> anyhow::Result<Arc<MonitorEngine>> {
	let providers = build_providers(&config.carriers).context("failed to build tracking providers")?;
	let store = Arc::new(SqliteMonitorStore::new(pool));
	let engine = MonitorEngine::new(store, providers, engine_settings(&config.monitor));

	let client = reqwest::Client::builder()
		.user_agent(concat!("shipwatch/", env!("CARGO_PKG_VERSION")))
		.build()
		.context("failed to build callback HTTP client")?;
	let signing_secret = config
		.webhook
		.callback_signing_secret
		.as_ref()
		.map(|s| s.as_bytes().to_vec());
	Arc::new(CallbackUrlNotifier::new(client, signing_secret)).attach(engine.callbacks());

	Ok(Arc::new(engine))
}
