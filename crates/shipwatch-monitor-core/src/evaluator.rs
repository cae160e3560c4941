// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pure status evaluation.
//!
//! Both the poll path and the webhook path call [`evaluate`] with the monitor
//! as last persisted (or synthesized), the fresh observation, and the current
//! time. Nothing here performs I/O or reads the clock.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::monitor::ShipmentMonitor;
use crate::status::TrackingStatus;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Outcome of comparing an observation against the previous monitor state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
	/// Status string differs from the last known one (exact, case-sensitive).
	pub transitioned: bool,
	/// Past the estimated delivery by strictly more than the monitor's threshold.
	pub delayed: bool,
	/// Hours past the estimated delivery; `0.0` when not overdue or no usable ETA.
	pub delay_hours: f64,
	/// Status contains "delivered", ignoring case.
	pub delivered: bool,
}

pub fn evaluate(
	previous: &ShipmentMonitor,
	raw: &TrackingStatus,
	now: DateTime<Utc>,
) -> Evaluation {
	let transitioned = raw.status != previous.last_known_status;
	let delivered = raw.status.to_lowercase().contains("delivered");

	let overdue_hours = raw
		.estimated_delivery
		.as_deref()
		.and_then(parse_timestamp)
		.filter(|eta| now > *eta)
		.map(|eta| now.signed_duration_since(eta).num_milliseconds() as f64 / MILLIS_PER_HOUR);

	let (delayed, delay_hours) = match overdue_hours {
		Some(hours) => (hours > previous.delay_threshold_hours, hours),
		None => (false, 0.0),
	};

	Evaluation {
		transitioned,
		delayed,
		delay_hours,
		delivered,
	}
}

/// Lenient carrier timestamp parsing.
///
/// Accepts RFC 3339 (`Z` or offset), naive ISO 8601 date-times with `T` or a
/// space separator (taken as UTC), and bare dates (midnight UTC). Anything
/// else yields `None`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
	let value = value.trim();
	if value.is_empty() {
		return None;
	}

	if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
		return Some(dt.with_timezone(&Utc));
	}

	if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
		return Some(dt.with_timezone(&Utc));
	}

	for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
		if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
			return Some(Utc.from_utc_datetime(&naive));
		}
	}

	NaiveDate::parse_from_str(value, "%Y-%m-%d")
		.ok()
		.and_then(|d| d.and_hms_opt(0, 0, 0))
		.map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use proptest::prelude::*;

	fn fixed_now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
	}

	fn monitor(status: &str, threshold: f64) -> ShipmentMonitor {
		ShipmentMonitor::new("NQ1", "naqel")
			.with_status(status)
			.with_delay_threshold_hours(threshold)
	}

	fn observed(status: &str, eta: Option<DateTime<Utc>>) -> TrackingStatus {
		let raw = TrackingStatus::new("NQ1", "naqel", status);
		match eta {
			Some(eta) => raw.with_estimated_delivery(eta.to_rfc3339()),
			None => raw,
		}
	}

	#[test]
	fn test_transition_is_exact_and_case_sensitive() {
		let now = fixed_now();
		let prev = monitor("In_Transit", 4.0);

		assert!(!evaluate(&prev, &observed("In_Transit", None), now).transitioned);
		assert!(evaluate(&prev, &observed("in_transit", None), now).transitioned);
		assert!(evaluate(&prev, &observed("In_Transit ", None), now).transitioned);
	}

	#[test]
	fn test_first_observation_is_a_transition() {
		let eval = evaluate(&monitor("", 4.0), &observed("picked_up", None), fixed_now());
		assert!(eval.transitioned);
	}

	#[test]
	fn test_delivered_matches_case_insensitively() {
		let now = fixed_now();
		let prev = monitor("in_transit", 4.0);

		assert!(evaluate(&prev, &observed("DELIVERED", None), now).delivered);
		assert!(evaluate(&prev, &observed("Delivered to customer", None), now).delivered);
		assert!(!evaluate(&prev, &observed("out_for_delivery", None), now).delivered);
	}

	#[test]
	fn test_delayed_past_threshold() {
		let now = fixed_now();
		let eval = evaluate(
			&monitor("in_transit", 4.0),
			&observed("in_transit", Some(now - Duration::hours(6))),
			now,
		);
		assert!(eval.delayed);
		assert!((eval.delay_hours - 6.0).abs() < 1e-9);
	}

	#[test]
	fn test_overdue_within_threshold_is_not_delayed() {
		let now = fixed_now();
		let eval = evaluate(
			&monitor("in_transit", 4.0),
			&observed("in_transit", Some(now - Duration::hours(3))),
			now,
		);
		assert!(!eval.delayed);
		assert!((eval.delay_hours - 3.0).abs() < 1e-9);
	}

	#[test]
	fn test_eta_equal_to_now_with_zero_threshold_is_not_delayed() {
		let now = fixed_now();
		let eval = evaluate(&monitor("in_transit", 0.0), &observed("in_transit", Some(now)), now);
		assert!(!eval.delayed);
		assert_eq!(eval.delay_hours, 0.0);
	}

	#[test]
	fn test_overdue_exactly_threshold_is_not_delayed() {
		let now = fixed_now();
		let eval = evaluate(
			&monitor("in_transit", 4.0),
			&observed("in_transit", Some(now - Duration::hours(4))),
			now,
		);
		assert!(!eval.delayed);

		let eval = evaluate(
			&monitor("in_transit", 4.0),
			&observed(
				"in_transit",
				Some(now - Duration::hours(4) - Duration::milliseconds(1)),
			),
			now,
		);
		assert!(eval.delayed);
	}

	#[test]
	fn test_future_eta_is_not_delayed() {
		let now = fixed_now();
		let eval = evaluate(
			&monitor("in_transit", 0.0),
			&observed("in_transit", Some(now + Duration::hours(10))),
			now,
		);
		assert!(!eval.delayed);
		assert_eq!(eval.delay_hours, 0.0);
	}

	#[test]
	fn test_missing_or_garbage_eta_is_not_delayed() {
		let now = fixed_now();
		let prev = monitor("in_transit", 0.0);

		assert!(!evaluate(&prev, &observed("in_transit", None), now).delayed);

		for eta in ["", "soon", "2025-13-45", "31/05/2025"] {
			let raw = TrackingStatus::new("NQ1", "naqel", "in_transit").with_estimated_delivery(eta);
			assert!(!evaluate(&prev, &raw, now).delayed, "eta {eta:?}");
		}
	}

	#[test]
	fn test_parse_timestamp_formats() {
		let expected = Utc.with_ymd_and_hms(2025, 5, 31, 6, 0, 0).unwrap();

		assert_eq!(parse_timestamp("2025-05-31T06:00:00Z"), Some(expected));
		assert_eq!(parse_timestamp("2025-05-31T09:00:00+03:00"), Some(expected));
		assert_eq!(parse_timestamp("2025-05-31T06:00:00"), Some(expected));
		assert_eq!(parse_timestamp("2025-05-31T06:00:00.000"), Some(expected));
		assert_eq!(parse_timestamp("2025-05-31 06:00:00"), Some(expected));
		assert_eq!(parse_timestamp("2025-05-31T06:00"), Some(expected));
		assert_eq!(
			parse_timestamp("2025-05-31"),
			Some(Utc.with_ymd_and_hms(2025, 5, 31, 0, 0, 0).unwrap())
		);
		assert_eq!(parse_timestamp("not a date"), None);
		assert_eq!(parse_timestamp("   "), None);
	}

	proptest! {
		#[test]
		fn evaluate_never_panics_on_arbitrary_eta(eta in ".*", status in ".*") {
			let raw = TrackingStatus::new("NQ1", "naqel", status).with_estimated_delivery(eta);
			let _ = evaluate(&monitor("in_transit", 4.0), &raw, fixed_now());
		}

		#[test]
		fn delayed_implies_strictly_over_threshold(
			overdue_minutes in -600i64..6000,
			threshold in 0.0f64..72.0
		) {
			let now = fixed_now();
			let raw = observed("in_transit", Some(now - Duration::minutes(overdue_minutes)));
			let eval = evaluate(&monitor("in_transit", threshold), &raw, now);
			prop_assert_eq!(eval.delayed, overdue_minutes > 0 && eval.delay_hours > threshold);
			if eval.delayed {
				prop_assert!(eval.delay_hours > threshold);
			}
		}
	}
}
