// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Carrier-pushed status updates.

use serde::{Deserialize, Serialize};
use shipwatch_monitor_core::{MonitorCoreError, ShipmentMonitor, TrackingStatus};

use crate::error::{MonitorError, Result};
use crate::pipeline::StatusOutcome;

/// Carrier used when a push does not name one.
pub const UNKNOWN_CARRIER: &str = "unknown";

/// Inbound webhook body. Only `tracking_number` is required.
///
/// Field names are snake_case; camelCase spellings are accepted too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
	#[serde(default, alias = "trackingNumber")]
	pub tracking_number: Option<String>,
	#[serde(default)]
	pub carrier: Option<String>,
	#[serde(default)]
	pub reference: Option<String>,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default, alias = "previousStatus")]
	pub previous_status: Option<String>,
	#[serde(default)]
	pub location: Option<String>,
	/// Carrier-side event time.
	#[serde(default)]
	pub timestamp: Option<String>,
	#[serde(default, alias = "estimatedDelivery")]
	pub estimated_delivery: Option<String>,
}

impl WebhookPayload {
	/// Split into the observation and the monitor to evaluate it against when
	/// the shipment is not being monitored.
	pub fn into_observation(
		self,
		default_delay_threshold_hours: f64,
	) -> Result<(TrackingStatus, ShipmentMonitor)> {
		let tracking_number = self
			.tracking_number
			.map(|tn| tn.trim().to_string())
			.filter(|tn| !tn.is_empty())
			.ok_or(MonitorCoreError::MissingTrackingNumber)?;
		let carrier = self
			.carrier
			.filter(|c| !c.trim().is_empty())
			.unwrap_or_else(|| UNKNOWN_CARRIER.to_string());

		let raw = TrackingStatus {
			tracking_number: tracking_number.clone(),
			carrier: carrier.clone(),
			status: self.status.unwrap_or_default(),
			location: self.location.unwrap_or_default(),
			estimated_delivery: self.estimated_delivery.filter(|e| !e.trim().is_empty()),
			last_updated: self.timestamp,
		};

		let fallback = ShipmentMonitor::new(tracking_number, carrier)
			.with_reference(self.reference.unwrap_or_default())
			.with_status(self.previous_status.unwrap_or_default())
			.with_delay_threshold_hours(default_delay_threshold_hours);

		Ok((raw, fallback))
	}
}

/// Webhook reply body: `{success, processed, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookResponse {
	pub success: bool,
	pub processed: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl WebhookResponse {
	pub fn processed() -> Self {
		Self {
			success: true,
			processed: true,
			error: None,
		}
	}

	pub fn rejected(error: impl Into<String>) -> Self {
		Self {
			success: false,
			processed: false,
			error: Some(error.into()),
		}
	}

	pub fn from_result(result: &Result<StatusOutcome>) -> Self {
		match result {
			Ok(_) => Self::processed(),
			Err(MonitorError::Validation(message)) => Self::rejected(message.clone()),
			Err(e) => Self::rejected(e.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_empty_payload_is_rejected() {
		let payload: WebhookPayload = serde_json::from_str("{}").unwrap();
		let err = payload.into_observation(4.0).unwrap_err();
		assert!(matches!(err, MonitorError::Validation(ref m) if m == "missing tracking number"));

		let response = WebhookResponse::from_result(&Err(err));
		assert_eq!(response, WebhookResponse::rejected("missing tracking number"));
		assert_eq!(
			serde_json::to_value(&response).unwrap(),
			serde_json::json!({"success": false, "processed": false, "error": "missing tracking number"})
		);
	}

	#[test]
	fn test_blank_tracking_number_is_rejected() {
		let payload = WebhookPayload {
			tracking_number: Some("  ".to_string()),
			..Default::default()
		};
		assert!(payload.into_observation(4.0).is_err());
	}

	#[test]
	fn test_payload_builds_observation_and_fallback() {
		let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
			"trackingNumber": "AX1",
			"carrier": "aramex",
			"status": "out_for_delivery",
			"previousStatus": "in_transit",
			"location": "Dammam",
			"timestamp": "2025-05-31T08:00:00Z",
			"estimatedDelivery": "2025-06-01",
		}))
		.unwrap();

		let (raw, fallback) = payload.into_observation(6.0).unwrap();
		assert_eq!(raw.tracking_number, "AX1");
		assert_eq!(raw.status, "out_for_delivery");
		assert_eq!(raw.location, "Dammam");
		assert_eq!(raw.last_updated.as_deref(), Some("2025-05-31T08:00:00Z"));
		assert_eq!(raw.estimated_delivery.as_deref(), Some("2025-06-01"));
		assert_eq!(fallback.last_known_status, "in_transit");
		assert_eq!(fallback.delay_threshold_hours, 6.0);
	}

	#[test]
	fn test_missing_carrier_defaults_to_unknown() {
		let payload = WebhookPayload {
			tracking_number: Some("X1".to_string()),
			estimated_delivery: Some(String::new()),
			..Default::default()
		};
		let (raw, fallback) = payload.into_observation(4.0).unwrap();
		assert_eq!(raw.carrier, UNKNOWN_CARRIER);
		assert_eq!(fallback.carrier, UNKNOWN_CARRIER);
		assert!(raw.estimated_delivery.is_none());
		assert!(fallback.last_known_status.is_empty());
	}
}
