// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Normalized carrier observation.

use serde::{Deserialize, Serialize};

/// What a tracking provider (or a carrier webhook) reports for one shipment.
///
/// Timestamps stay as the carrier sent them; [`crate::parse_timestamp`]
/// interprets them when needed so a malformed value never fails the fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingStatus {
	pub tracking_number: String,
	pub carrier: String,
	pub status: String,
	#[serde(default)]
	pub location: String,
	#[serde(default)]
	pub estimated_delivery: Option<String>,
	/// Carrier-side time of the reported event.
	#[serde(default)]
	pub last_updated: Option<String>,
}

impl TrackingStatus {
	pub fn new(
		tracking_number: impl Into<String>,
		carrier: impl Into<String>,
		status: impl Into<String>,
	) -> Self {
		Self {
			tracking_number: tracking_number.into(),
			carrier: carrier.into(),
			status: status.into(),
			..Default::default()
		}
	}

	pub fn with_location(mut self, location: impl Into<String>) -> Self {
		self.location = location.into();
		self
	}

	pub fn with_estimated_delivery(mut self, estimated_delivery: impl Into<String>) -> Self {
		self.estimated_delivery = Some(estimated_delivery.into());
		self
	}

	pub fn with_last_updated(mut self, last_updated: impl Into<String>) -> Self {
		self.last_updated = Some(last_updated.into());
		self
	}
}
