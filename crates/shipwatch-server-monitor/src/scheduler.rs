// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background polling loop with a bounded worker pool.
//!
//! `STOPPED -> RUNNING` on [`PollScheduler::start`], back on
//! [`PollScheduler::stop`]. While running, the loop waits for the interval
//! (or cancellation), loads active monitors and polls each on its own task,
//! at most `max_workers` at a time and each bounded by `task_timeout`.
//! A failure or timeout on one shipment never holds up the others; the next
//! cycle is the retry.
//!
//! Loop cycles and [`PollScheduler::run_once`] draw from the same worker
//! permits, so `max_workers` bounds all polling combined. A manual cycle that
//! overlaps a running loop is cancelled by `stop()` along with it.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{MonitorError, Result};
use crate::pipeline::{PollOutcome, StatusPipeline};
use crate::provider::ProviderRegistry;

/// Per-cycle error entries kept in a [`CycleReport`].
pub const MAX_REPORTED_ERRORS: usize = 20;

/// Extra time `stop()` waits on the loop beyond the task grace period.
const STOP_MARGIN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
	pub interval: Duration,
	pub max_workers: usize,
	pub task_timeout: Duration,
	pub shutdown_grace: Duration,
	pub error_backoff: Duration,
}

impl Default for SchedulerSettings {
	fn default() -> Self {
		Self {
			interval: Duration::from_secs(30 * 60),
			max_workers: 5,
			task_timeout: Duration::from_secs(60),
			shutdown_grace: Duration::from_secs(30),
			error_backoff: Duration::from_secs(60),
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleError {
	pub tracking_number: String,
	pub error: String,
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
	pub started_at: DateTime<Utc>,
	pub finished_at: DateTime<Utc>,
	/// Monitors dispatched to workers.
	pub checked: usize,
	pub succeeded: usize,
	/// Deactivated between listing and processing.
	pub skipped: usize,
	pub failed: usize,
	pub timed_out: usize,
	/// Still running when the shutdown grace period ran out.
	pub abandoned: usize,
	pub errors: Vec<CycleError>,
}

impl CycleReport {
	fn new(started_at: DateTime<Utc>) -> Self {
		Self {
			started_at,
			finished_at: started_at,
			checked: 0,
			succeeded: 0,
			skipped: 0,
			failed: 0,
			timed_out: 0,
			abandoned: 0,
			errors: Vec::new(),
		}
	}

	fn push_error(&mut self, tracking_number: String, error: String) {
		if self.errors.len() < MAX_REPORTED_ERRORS {
			self.errors.push(CycleError {
				tracking_number,
				error,
			});
		}
	}

	fn record(&mut self, joined: std::result::Result<(String, TaskResult), tokio::task::JoinError>) {
		let (tracking_number, result) = match joined {
			Ok(done) => done,
			Err(_) => {
				self.abandoned += 1;
				return;
			}
		};

		match result {
			TaskResult::Done(Ok(PollOutcome::Checked(_))) => self.succeeded += 1,
			TaskResult::Done(Ok(PollOutcome::Skipped)) => self.skipped += 1,
			TaskResult::Done(Err(e)) => {
				warn!(tracking_number = %tracking_number, error = %e, "status check failed");
				self.failed += 1;
				self.push_error(tracking_number, e.to_string());
			}
			TaskResult::TimedOut => {
				warn!(tracking_number = %tracking_number, "status check timed out");
				self.timed_out += 1;
				self.push_error(tracking_number, "timed out".to_string());
			}
			TaskResult::Panicked => {
				error!(tracking_number = %tracking_number, "status check panicked");
				self.failed += 1;
				self.push_error(tracking_number, "panicked".to_string());
			}
		}
	}
}

enum TaskResult {
	Done(Result<PollOutcome>),
	TimedOut,
	Panicked,
}

struct RunningLoop {
	token: CancellationToken,
	handle: JoinHandle<()>,
}

pub struct PollScheduler {
	pipeline: StatusPipeline,
	providers: Arc<ProviderRegistry>,
	settings: SchedulerSettings,
	workers: Arc<Semaphore>,
	/// Held across a whole `start()` or `stop()`, so a start waits for the
	/// previous loop to finish draining.
	lifecycle: Mutex<()>,
	running: Mutex<Option<RunningLoop>>,
	last_cycle: Arc<RwLock<Option<CycleReport>>>,
}

impl PollScheduler {
	pub fn new(
		pipeline: StatusPipeline,
		providers: Arc<ProviderRegistry>,
		settings: SchedulerSettings,
	) -> Self {
		let workers = Arc::new(Semaphore::new(settings.max_workers.max(1)));
		Self {
			pipeline,
			providers,
			settings,
			workers,
			lifecycle: Mutex::new(()),
			running: Mutex::new(None),
			last_cycle: Arc::new(RwLock::new(None)),
		}
	}

	pub fn settings(&self) -> &SchedulerSettings {
		&self.settings
	}

	#[instrument(skip(self))]
	pub async fn start(&self) -> Result<()> {
		let _lifecycle = self.lifecycle.lock().await;
		let mut running = self.running.lock().await;
		if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
			return Err(MonitorError::AlreadyRunning);
		}

		let token = CancellationToken::new();
		let handle = tokio::spawn(run_loop(
			self.pipeline.clone(),
			Arc::clone(&self.providers),
			self.settings.clone(),
			Arc::clone(&self.workers),
			Arc::clone(&self.last_cycle),
			token.clone(),
		));

		*running = Some(RunningLoop { token, handle });
		Ok(())
	}

	/// Signal the loop to stop and wait for in-flight tasks, up to the grace period.
	#[instrument(skip(self))]
	pub async fn stop(&self) -> Result<()> {
		let _lifecycle = self.lifecycle.lock().await;
		let Some(RunningLoop { token, mut handle }) = self.running.lock().await.take() else {
			return Err(MonitorError::NotRunning);
		};

		token.cancel();
		match tokio::time::timeout(self.settings.shutdown_grace + STOP_MARGIN, &mut handle).await {
			Ok(Ok(())) => {}
			Ok(Err(e)) => error!(error = %e, "monitoring loop ended abnormally"),
			Err(_) => {
				warn!("monitoring loop did not stop in time, aborting");
				handle.abort();
			}
		}
		Ok(())
	}

	pub async fn is_running(&self) -> bool {
		self
			.running
			.lock()
			.await
			.as_ref()
			.is_some_and(|r| !r.handle.is_finished())
	}

	/// Run one cycle now, outside the loop's cadence.
	pub async fn run_once(&self) -> Result<CycleReport> {
		let cancel = self
			.running
			.lock()
			.await
			.as_ref()
			.map(|r| r.token.clone())
			.unwrap_or_else(CancellationToken::new);

		let report = run_cycle(
			&self.pipeline,
			&self.providers,
			&self.settings,
			&self.workers,
			&cancel,
		)
		.await?;
		*self.last_cycle.write().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
		Ok(report)
	}

	pub fn last_cycle(&self) -> Option<CycleReport> {
		self
			.last_cycle
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}
}

async fn run_loop(
	pipeline: StatusPipeline,
	providers: Arc<ProviderRegistry>,
	settings: SchedulerSettings,
	workers: Arc<Semaphore>,
	last_cycle: Arc<RwLock<Option<CycleReport>>>,
	token: CancellationToken,
) {
	info!(
		interval_secs = settings.interval.as_secs(),
		max_workers = settings.max_workers,
		"monitoring loop started"
	);

	let mut delay = settings.interval;
	loop {
		tokio::select! {
			biased;
			_ = token.cancelled() => break,
			_ = tokio::time::sleep(delay) => {}
		}

		match run_cycle(&pipeline, &providers, &settings, &workers, &token).await {
			Ok(report) => {
				*last_cycle.write().unwrap_or_else(PoisonError::into_inner) = Some(report);
				delay = settings.interval;
			}
			Err(e) => {
				error!(
					error = %e,
					backoff_secs = settings.error_backoff.as_secs(),
					"monitoring cycle failed"
				);
				delay = settings.error_backoff;
			}
		}
	}

	info!("monitoring loop stopped");
}

/// One poll cycle. Errors only when the active monitor list cannot be loaded.
async fn run_cycle(
	pipeline: &StatusPipeline,
	providers: &Arc<ProviderRegistry>,
	settings: &SchedulerSettings,
	workers: &Arc<Semaphore>,
	cancel: &CancellationToken,
) -> Result<CycleReport> {
	let mut report = CycleReport::new(Utc::now());
	let monitors = pipeline.store().list_active_monitors().await?;
	debug!(count = monitors.len(), "starting poll cycle");

	let mut tasks = JoinSet::new();

	for monitor in monitors {
		let permit = tokio::select! {
			biased;
			_ = cancel.cancelled() => break,
			permit = Arc::clone(workers).acquire_owned() => match permit {
				Ok(permit) => permit,
				Err(_) => break,
			},
		};

		report.checked += 1;
		let pipeline = pipeline.clone();
		let providers = Arc::clone(providers);
		let task_timeout = settings.task_timeout;

		tasks.spawn(async move {
			let _permit = permit;
			let checked = AssertUnwindSafe(tokio::time::timeout(
				task_timeout,
				pipeline.poll(&providers, &monitor),
			))
			.catch_unwind()
			.await;

			let result = match checked {
				Ok(Ok(outcome)) => TaskResult::Done(outcome),
				Ok(Err(_elapsed)) => TaskResult::TimedOut,
				Err(_) => TaskResult::Panicked,
			};
			(monitor.tracking_number, result)
		});
	}

	let drained = tokio::select! {
		biased;
		_ = cancel.cancelled() => false,
		_ = drain(&mut tasks, &mut report) => true,
	};

	if !drained {
		info!(in_flight = tasks.len(), "stop requested, waiting for in-flight checks");
		let graceful =
			tokio::time::timeout(settings.shutdown_grace, drain(&mut tasks, &mut report)).await;
		if graceful.is_err() {
			warn!(in_flight = tasks.len(), "grace period elapsed, abandoning checks");
			tasks.abort_all();
			drain(&mut tasks, &mut report).await;
		}
	}

	report.finished_at = Utc::now();
	info!(
		checked = report.checked,
		succeeded = report.succeeded,
		skipped = report.skipped,
		failed = report.failed,
		timed_out = report.timed_out,
		abandoned = report.abandoned,
		"poll cycle finished"
	);
	Ok(report)
}

async fn drain(tasks: &mut JoinSet<(String, TaskResult)>, report: &mut CycleReport) {
	while let Some(joined) = tasks.join_next().await {
		report.record(joined);
	}
}
