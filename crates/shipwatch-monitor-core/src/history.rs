// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Append-only status history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::evaluator::parse_timestamp;
use crate::status::TrackingStatus;

/// A stored observation. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
	pub id: i64,
	pub tracking_number: String,
	pub carrier: String,
	pub status: String,
	pub location: String,
	pub timestamp: DateTime<Utc>,
	/// Full observation as reported, for audit.
	pub details: serde_json::Value,
	pub created_at: DateTime<Utc>,
}

/// An observation about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
	pub tracking_number: String,
	pub carrier: String,
	pub status: String,
	pub location: String,
	pub timestamp: DateTime<Utc>,
	pub details: serde_json::Value,
}

impl NewHistoryEntry {
	/// Build from an observation. The carrier's own event time wins over
	/// `observed_at` when it parses.
	pub fn from_status(raw: &TrackingStatus, observed_at: DateTime<Utc>) -> Result<Self> {
		let timestamp = raw
			.last_updated
			.as_deref()
			.and_then(parse_timestamp)
			.unwrap_or(observed_at);

		Ok(Self {
			tracking_number: raw.tracking_number.clone(),
			carrier: raw.carrier.clone(),
			status: raw.status.clone(),
			location: raw.location.clone(),
			timestamp,
			details: serde_json::to_value(raw)?,
		})
	}
}
