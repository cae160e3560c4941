// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivers monitor events to each monitor's `callback_url`.

use chrono::Utc;
use serde::Serialize;
use shipwatch_common_webhook::{signature_header_value, SIGNATURE_HEADER};
use shipwatch_monitor_core::{ShipmentMonitor, TrackingStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::callbacks::{CallbackEvent, CallbackRegistry};

pub const EVENT_HEADER: &str = "X-Shipwatch-Event";
pub const DELIVERY_HEADER: &str = "X-Shipwatch-Delivery";

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON body POSTed to a monitor's callback URL.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackEventBody {
	pub event: &'static str,
	pub tracking_number: String,
	pub carrier: String,
	pub reference: String,
	pub previous_status: String,
	pub status: String,
	pub location: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub estimated_delivery: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delay_hours: Option<f64>,
	pub occurred_at: String,
}

impl CallbackEventBody {
	fn new(
		event: CallbackEvent,
		monitor: &ShipmentMonitor,
		raw: &TrackingStatus,
		delay_hours: Option<f64>,
	) -> Self {
		Self {
			event: event.as_str(),
			tracking_number: monitor.tracking_number.clone(),
			carrier: monitor.carrier.clone(),
			reference: monitor.reference.clone(),
			previous_status: monitor.last_known_status.clone(),
			status: raw.status.clone(),
			location: raw.location.clone(),
			estimated_delivery: raw.estimated_delivery.clone(),
			delay_hours,
			occurred_at: Utc::now().to_rfc3339(),
		}
	}
}

/// Listener that forwards engine events over HTTP.
///
/// Each delivery runs on its own task so a slow receiver never holds up the
/// pipeline. Failed deliveries are logged and dropped.
pub struct CallbackUrlNotifier {
	client: reqwest::Client,
	signing_secret: Option<Vec<u8>>,
}

impl CallbackUrlNotifier {
	pub fn new(client: reqwest::Client, signing_secret: Option<Vec<u8>>) -> Self {
		Self {
			client,
			signing_secret,
		}
	}

	/// Register delay, status change and delivery listeners on `callbacks`.
	pub fn attach(self: Arc<Self>, callbacks: &CallbackRegistry) {
		let notifier = Arc::clone(&self);
		callbacks.register_delay(move |monitor, delay_hours, raw| {
			notifier.dispatch(CallbackEvent::Delay, monitor, raw, Some(delay_hours));
			Ok(())
		});

		let notifier = Arc::clone(&self);
		callbacks.register_status_change(move |monitor, _new_status, raw| {
			notifier.dispatch(CallbackEvent::StatusChange, monitor, raw, None);
			Ok(())
		});

		let notifier = self;
		callbacks.register_delivery(move |monitor, raw| {
			notifier.dispatch(CallbackEvent::Delivery, monitor, raw, None);
			Ok(())
		});
	}

	fn dispatch(
		&self,
		event: CallbackEvent,
		monitor: &ShipmentMonitor,
		raw: &TrackingStatus,
		delay_hours: Option<f64>,
	) {
		let Some(url) = monitor.callback_url.clone() else {
			return;
		};

		let body = CallbackEventBody::new(event, monitor, raw, delay_hours);
		let payload = match serde_json::to_vec(&body) {
			Ok(payload) => payload,
			Err(e) => {
				warn!(error = %e, "failed to encode callback body");
				return;
			}
		};

		let Ok(runtime) = tokio::runtime::Handle::try_current() else {
			warn!(tracking_number = %monitor.tracking_number, "no runtime for callback delivery");
			return;
		};

		let request = self.build_request(&url, event, payload);
		let tracking_number = monitor.tracking_number.clone();
		runtime.spawn(async move {
			match request.send().await {
				Ok(response) if response.status().is_success() => {
					debug!(tracking_number = %tracking_number, event = event.as_str(), "callback delivered");
				}
				Ok(response) => {
					warn!(
						tracking_number = %tracking_number,
						event = event.as_str(),
						status = response.status().as_u16(),
						"callback rejected"
					);
				}
				Err(e) => {
					warn!(tracking_number = %tracking_number, event = event.as_str(), error = %e, "callback delivery failed");
				}
			}
		});
	}

	fn build_request(
		&self,
		url: &str,
		event: CallbackEvent,
		payload: Vec<u8>,
	) -> reqwest::RequestBuilder {
		let mut request = self
			.client
			.post(url)
			.header("Content-Type", "application/json")
			.header(EVENT_HEADER, event.as_str())
			.header(DELIVERY_HEADER, Uuid::new_v4().to_string())
			.timeout(DELIVERY_TIMEOUT);

		if let Some(secret) = &self.signing_secret {
			request = request.header(SIGNATURE_HEADER, signature_header_value(secret, &payload));
		}

		request.body(payload)
	}
}
