// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shipwatch_monitor_core::TrackingStatus;
use shipwatch_server_db::{testing::create_test_pool, SqliteMonitorStore};
use shipwatch_server_monitor::{
	EngineSettings, MonitorEngine, ProviderError, ProviderRegistry, SchedulerSettings,
	TrackingProvider,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub enum Script {
	Status {
		status: String,
		estimated_delivery: Option<DateTime<Utc>>,
	},
	Fail,
	Hang(Duration),
}

impl Script {
	pub fn status(status: &str) -> Self {
		Script::Status {
			status: status.to_string(),
			estimated_delivery: None,
		}
	}

	pub fn overdue(status: &str, eta: DateTime<Utc>) -> Self {
		Script::Status {
			status: status.to_string(),
			estimated_delivery: Some(eta),
		}
	}
}

/// Provider whose answers are set per tracking number by the test.
pub struct ScriptedProvider {
	carrier: String,
	scripts: Mutex<HashMap<String, Script>>,
	calls: AtomicUsize,
	in_flight: AtomicUsize,
	peak: AtomicUsize,
}

impl ScriptedProvider {
	pub fn new(carrier: &str) -> Arc<Self> {
		Arc::new(Self {
			carrier: carrier.to_string(),
			scripts: Mutex::new(HashMap::new()),
			calls: AtomicUsize::new(0),
			in_flight: AtomicUsize::new(0),
			peak: AtomicUsize::new(0),
		})
	}

	pub fn set(&self, tracking_number: &str, script: Script) {
		self
			.scripts
			.lock()
			.unwrap()
			.insert(tracking_number.to_string(), script);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Most `track` calls that were ever in flight at once.
	pub fn peak_concurrency(&self) -> usize {
		self.peak.load(Ordering::SeqCst)
	}
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::SeqCst);
	}
}

#[async_trait]
impl TrackingProvider for ScriptedProvider {
	fn carrier(&self) -> &str {
		&self.carrier
	}

	async fn track(&self, tracking_number: &str) -> Result<TrackingStatus, ProviderError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.peak.fetch_max(now, Ordering::SeqCst);
		let _in_flight = InFlight(&self.in_flight);
		let script = self.scripts.lock().unwrap().get(tracking_number).cloned();

		match script {
			Some(Script::Status {
				status,
				estimated_delivery,
			}) => {
				let raw = TrackingStatus::new(tracking_number, &self.carrier, status)
					.with_location("Riyadh");
				Ok(match estimated_delivery {
					Some(eta) => raw.with_estimated_delivery(eta.to_rfc3339()),
					None => raw,
				})
			}
			Some(Script::Hang(duration)) => {
				tokio::time::sleep(duration).await;
				Err(ProviderError::Timeout)
			}
			Some(Script::Fail) | None => Err(ProviderError::Network("connection refused".to_string())),
		}
	}
}

pub fn fast_settings() -> EngineSettings {
	EngineSettings {
		scheduler: SchedulerSettings {
			interval: Duration::from_millis(20),
			max_workers: 5,
			task_timeout: Duration::from_secs(5),
			shutdown_grace: Duration::from_secs(1),
			error_backoff: Duration::from_millis(20),
		},
		..EngineSettings::default()
	}
}

pub async fn engine_with(
	provider: Arc<ScriptedProvider>,
	settings: EngineSettings,
) -> Arc<MonitorEngine> {
	let pool = create_test_pool().await.unwrap();
	let store = Arc::new(SqliteMonitorStore::new(pool));
	let providers = ProviderRegistry::new().with_provider(provider);
	Arc::new(MonitorEngine::new(store, providers, settings))
}

/// Counters for every listener kind, registered on `engine`.
#[derive(Clone, Default)]
pub struct Counters {
	pub delay: Arc<AtomicUsize>,
	pub status_change: Arc<AtomicUsize>,
	pub delivery: Arc<AtomicUsize>,
}

impl Counters {
	pub fn attach(engine: &MonitorEngine) -> Self {
		let counters = Self::default();

		let c = counters.delay.clone();
		engine.register_delay_callback(move |_, _, _| {
			c.fetch_add(1, Ordering::SeqCst);
			Ok(())
		});
		let c = counters.status_change.clone();
		engine.register_status_change_callback(move |_, _, _| {
			c.fetch_add(1, Ordering::SeqCst);
			Ok(())
		});
		let c = counters.delivery.clone();
		engine.register_delivery_callback(move |_, _| {
			c.fetch_add(1, Ordering::SeqCst);
			Ok(())
		});

		counters
	}

	pub fn delay(&self) -> usize {
		self.delay.load(Ordering::SeqCst)
	}

	pub fn status_change(&self) -> usize {
		self.status_change.load(Ordering::SeqCst)
	}

	pub fn delivery(&self) -> usize {
		self.delivery.load(Ordering::SeqCst)
	}
}
