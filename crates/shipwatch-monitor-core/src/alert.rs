// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Alert records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MonitorCoreError;

/// Delays strictly above this many hours are HIGH severity.
pub const HIGH_SEVERITY_DELAY_HOURS: f64 = 24.0;

/// Row id of a stored alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub i64);

impl fmt::Display for AlertId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for AlertId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(s.parse()?))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
	/// Shipment is past its estimated delivery by more than its SLA.
	Delay,
}

impl fmt::Display for AlertType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Delay => write!(f, "DELAY"),
		}
	}
}

impl FromStr for AlertType {
	type Err = MonitorCoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"DELAY" => Ok(Self::Delay),
			_ => Err(MonitorCoreError::UnknownAlertType(s.to_string())),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
	Medium,
	High,
}

impl AlertSeverity {
	pub fn for_delay(delay_hours: f64) -> Self {
		if delay_hours > HIGH_SEVERITY_DELAY_HOURS {
			Self::High
		} else {
			Self::Medium
		}
	}
}

impl fmt::Display for AlertSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Medium => write!(f, "MEDIUM"),
			Self::High => write!(f, "HIGH"),
		}
	}
}

impl FromStr for AlertSeverity {
	type Err = MonitorCoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"MEDIUM" => Ok(Self::Medium),
			"HIGH" => Ok(Self::High),
			_ => Err(MonitorCoreError::UnknownSeverity(s.to_string())),
		}
	}
}

/// A stored alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
	pub id: AlertId,
	pub tracking_number: String,
	pub alert_type: AlertType,
	pub message: String,
	pub severity: AlertSeverity,
	pub triggered_at: DateTime<Utc>,
	/// Last time the triggering condition was observed.
	pub last_seen_at: DateTime<Utc>,
	pub resolved_at: Option<DateTime<Utc>>,
	pub active: bool,
	pub delay_hours: Option<f64>,
	/// How many evaluations have reported this condition while the alert was active.
	pub occurrences: u32,
}

/// An alert condition about to be recorded. Recording either creates a new
/// active alert or extends the one already active for the same
/// `(tracking_number, alert_type)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
	pub tracking_number: String,
	pub alert_type: AlertType,
	pub message: String,
	pub severity: AlertSeverity,
	pub triggered_at: DateTime<Utc>,
	pub delay_hours: Option<f64>,
}

impl NewAlert {
	pub fn delay(tracking_number: impl Into<String>, delay_hours: f64, now: DateTime<Utc>) -> Self {
		Self {
			tracking_number: tracking_number.into(),
			alert_type: AlertType::Delay,
			message: format!("Shipment delayed by {delay_hours:.1} hours"),
			severity: AlertSeverity::for_delay(delay_hours),
			triggered_at: now,
			delay_hours: Some(delay_hours),
		}
	}
}
