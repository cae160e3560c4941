// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Poll loop and SLA defaults.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
	/// Cadence of the poll loop, and the default for new monitors.
	pub check_interval_minutes: u32,
	/// Default SLA for new monitors and unmonitored webhook pushes.
	pub delay_threshold_hours: f64,
	pub max_workers: usize,
	pub task_timeout_secs: u64,
	pub shutdown_grace_secs: u64,
	pub error_backoff_secs: u64,
	/// Start the poll loop when the server boots.
	pub autostart: bool,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		MonitorConfigLayer::default().finalize()
	}
}

impl MonitorConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_secs(u64::from(self.check_interval_minutes) * 60)
	}

	pub fn task_timeout(&self) -> Duration {
		Duration::from_secs(self.task_timeout_secs)
	}

	pub fn shutdown_grace(&self) -> Duration {
		Duration::from_secs(self.shutdown_grace_secs)
	}

	pub fn error_backoff(&self) -> Duration {
		Duration::from_secs(self.error_backoff_secs)
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorConfigLayer {
	#[serde(default)]
	pub check_interval_minutes: Option<u32>,
	#[serde(default)]
	pub delay_threshold_hours: Option<f64>,
	#[serde(default)]
	pub max_workers: Option<usize>,
	#[serde(default)]
	pub task_timeout_secs: Option<u64>,
	#[serde(default)]
	pub shutdown_grace_secs: Option<u64>,
	#[serde(default)]
	pub error_backoff_secs: Option<u64>,
	#[serde(default)]
	pub autostart: Option<bool>,
}

impl MonitorConfigLayer {
	pub fn merge(&mut self, other: MonitorConfigLayer) {
		if other.check_interval_minutes.is_some() {
			self.check_interval_minutes = other.check_interval_minutes;
		}
		if other.delay_threshold_hours.is_some() {
			self.delay_threshold_hours = other.delay_threshold_hours;
		}
		if other.max_workers.is_some() {
			self.max_workers = other.max_workers;
		}
		if other.task_timeout_secs.is_some() {
			self.task_timeout_secs = other.task_timeout_secs;
		}
		if other.shutdown_grace_secs.is_some() {
			self.shutdown_grace_secs = other.shutdown_grace_secs;
		}
		if other.error_backoff_secs.is_some() {
			self.error_backoff_secs = other.error_backoff_secs;
		}
		if other.autostart.is_some() {
			self.autostart = other.autostart;
		}
	}

	pub fn finalize(self) -> MonitorConfig {
		MonitorConfig {
			check_interval_minutes: self.check_interval_minutes.unwrap_or(30),
			delay_threshold_hours: self.delay_threshold_hours.unwrap_or(4.0),
			max_workers: self.max_workers.unwrap_or(5),
			task_timeout_secs: self.task_timeout_secs.unwrap_or(60),
			shutdown_grace_secs: self.shutdown_grace_secs.unwrap_or(30),
			error_backoff_secs: self.error_backoff_secs.unwrap_or(60),
			autostart: self.autostart.unwrap_or(true),
		}
	}
}
