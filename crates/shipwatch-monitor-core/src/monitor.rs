// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shipment monitor records and the evaluation context built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MonitorCoreError, Result};

pub const DEFAULT_DELAY_THRESHOLD_HOURS: f64 = 4.0;
pub const DEFAULT_CHECK_INTERVAL_MINUTES: u32 = 30;

/// A shipment under active observation.
///
/// Keyed by `tracking_number`. At most one active record exists per tracking
/// number; re-adding an inactive one reactivates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentMonitor {
	pub tracking_number: String,
	pub carrier: String,
	/// Caller-supplied reference (order id, pickup id, ...).
	#[serde(default)]
	pub reference: String,
	/// Last status string observed from the carrier. Empty until the first observation.
	#[serde(default)]
	pub last_known_status: String,
	#[serde(default)]
	pub last_updated: Option<DateTime<Utc>>,
	#[serde(default = "default_threshold")]
	pub delay_threshold_hours: f64,
	#[serde(default = "default_interval")]
	pub check_interval_minutes: u32,
	#[serde(default)]
	pub callback_url: Option<String>,
	#[serde(default = "default_active")]
	pub active: bool,
	#[serde(default = "Utc::now")]
	pub created_at: DateTime<Utc>,
}

fn default_threshold() -> f64 {
	DEFAULT_DELAY_THRESHOLD_HOURS
}

fn default_interval() -> u32 {
	DEFAULT_CHECK_INTERVAL_MINUTES
}

fn default_active() -> bool {
	true
}

impl ShipmentMonitor {
	/// New active monitor with default SLA settings.
	pub fn new(tracking_number: impl Into<String>, carrier: impl Into<String>) -> Self {
		Self {
			tracking_number: tracking_number.into(),
			carrier: carrier.into(),
			reference: String::new(),
			last_known_status: String::new(),
			last_updated: None,
			delay_threshold_hours: DEFAULT_DELAY_THRESHOLD_HOURS,
			check_interval_minutes: DEFAULT_CHECK_INTERVAL_MINUTES,
			callback_url: None,
			active: true,
			created_at: Utc::now(),
		}
	}

	pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
		self.reference = reference.into();
		self
	}

	pub fn with_status(mut self, status: impl Into<String>) -> Self {
		self.last_known_status = status.into();
		self
	}

	pub fn with_delay_threshold_hours(mut self, hours: f64) -> Self {
		self.delay_threshold_hours = hours;
		self
	}

	pub fn with_check_interval_minutes(mut self, minutes: u32) -> Self {
		self.check_interval_minutes = minutes;
		self
	}

	pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
		self.callback_url = Some(url.into());
		self
	}

	pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
		self.created_at = created_at;
		self
	}

	/// Reject records that can never be evaluated.
	pub fn validate(&self) -> Result<()> {
		if self.tracking_number.trim().is_empty() {
			return Err(MonitorCoreError::MissingTrackingNumber);
		}
		Ok(())
	}
}

/// The monitor an evaluation runs against.
///
/// Poll tasks always evaluate a persisted record. Webhook pushes evaluate the
/// persisted record when one exists, otherwise a monitor synthesized from the
/// payload that is never written back.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorContext {
	Persisted(ShipmentMonitor),
	Transient(ShipmentMonitor),
}

impl MonitorContext {
	pub fn monitor(&self) -> &ShipmentMonitor {
		match self {
			Self::Persisted(m) | Self::Transient(m) => m,
		}
	}

	pub fn is_persisted(&self) -> bool {
		matches!(self, Self::Persisted(_))
	}

	pub fn tracking_number(&self) -> &str {
		&self.monitor().tracking_number
	}

	pub fn into_monitor(self) -> ShipmentMonitor {
		match self {
			Self::Persisted(m) | Self::Transient(m) => m,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_new_uses_defaults() {
		let m = ShipmentMonitor::new("NQ1", "naqel");
		assert_eq!(m.tracking_number, "NQ1");
		assert_eq!(m.carrier, "naqel");
		assert!(m.active);
		assert!(m.last_known_status.is_empty());
		assert_eq!(m.delay_threshold_hours, DEFAULT_DELAY_THRESHOLD_HOURS);
		assert_eq!(m.check_interval_minutes, DEFAULT_CHECK_INTERVAL_MINUTES);
		assert!(m.callback_url.is_none());
	}

	#[test]
	fn test_validate_rejects_blank_tracking_number() {
		let m = ShipmentMonitor::new("   ", "aramex");
		assert!(matches!(
			m.validate(),
			Err(MonitorCoreError::MissingTrackingNumber)
		));
		assert!(ShipmentMonitor::new("AX9", "aramex").validate().is_ok());
	}

	#[test]
	fn test_deserialize_minimal_payload_fills_defaults() {
		let m: ShipmentMonitor =
			serde_json::from_str(r#"{"tracking_number":"AX1","carrier":"aramex"}"#).unwrap();
		assert!(m.active);
		assert_eq!(m.delay_threshold_hours, 4.0);
		assert_eq!(m.check_interval_minutes, 30);
		assert!(m.reference.is_empty());
	}

	#[test]
	fn test_context_accessors() {
		let m = ShipmentMonitor::new("NQ1", "naqel").with_status("in_transit");
		let persisted = MonitorContext::Persisted(m.clone());
		let transient = MonitorContext::Transient(m.clone());

		assert!(persisted.is_persisted());
		assert!(!transient.is_persisted());
		assert_eq!(transient.tracking_number(), "NQ1");
		assert_eq!(persisted.monitor().last_known_status, "in_transit");
		assert_eq!(transient.into_monitor(), m);
	}
}
