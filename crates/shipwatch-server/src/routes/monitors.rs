// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use serde::Deserialize;
use shipwatch_monitor_core::{ShipmentMonitor, StatusHistoryEntry};

use crate::api::AppState;
use crate::error::ServerError;

#[derive(Debug, Deserialize)]
pub struct CreateMonitorRequest {
	pub tracking_number: String,
	pub carrier: String,
	#[serde(default)]
	pub reference: Option<String>,
	#[serde(default)]
	pub delay_threshold_hours: Option<f64>,
	#[serde(default)]
	pub check_interval_minutes: Option<u32>,
	#[serde(default)]
	pub callback_url: Option<String>,
}

/// GET /api/monitors
pub async fn list_monitors(
	State(state): State<AppState>,
) -> Result<Json<Vec<ShipmentMonitor>>, ServerError> {
	Ok(Json(state.engine.list_active_monitors().await?))
}

/// POST /api/monitors
pub async fn create_monitor(
	State(state): State<AppState>,
	Json(request): Json<CreateMonitorRequest>,
) -> Result<impl IntoResponse, ServerError> {
	let mut monitor = state
		.engine
		.new_monitor(request.tracking_number, request.carrier);
	if let Some(reference) = request.reference {
		monitor = monitor.with_reference(reference);
	}
	if let Some(hours) = request.delay_threshold_hours {
		monitor = monitor.with_delay_threshold_hours(hours);
	}
	if let Some(minutes) = request.check_interval_minutes {
		monitor = monitor.with_check_interval_minutes(minutes);
	}
	if let Some(url) = request.callback_url.filter(|u| !u.trim().is_empty()) {
		monitor = monitor.with_callback_url(url);
	}

	let stored = state.engine.add_monitor(monitor).await?;
	Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/monitors/{tracking_number}
pub async fn get_monitor(
	State(state): State<AppState>,
	Path(tracking_number): Path<String>,
) -> Result<Json<ShipmentMonitor>, ServerError> {
	state
		.engine
		.get_monitor(&tracking_number)
		.await?
		.map(Json)
		.ok_or_else(|| ServerError::NotFound(format!("no monitor for {tracking_number}")))
}

/// DELETE /api/monitors/{tracking_number}
pub async fn delete_monitor(
	State(state): State<AppState>,
	Path(tracking_number): Path<String>,
) -> Result<StatusCode, ServerError> {
	if state.engine.remove_monitor(&tracking_number).await? {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(ServerError::NotFound(format!(
			"{tracking_number} is not being monitored"
		)))
	}
}

/// GET /api/monitors/{tracking_number}/history
pub async fn get_history(
	State(state): State<AppState>,
	Path(tracking_number): Path<String>,
) -> Result<Json<Vec<StatusHistoryEntry>>, ServerError> {
	Ok(Json(state.engine.get_shipment_history(&tracking_number).await?))
}
