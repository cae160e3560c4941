// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{Path, State},
	Json,
};
use shipwatch_monitor_core::{Alert, AlertId};

use crate::api::AppState;
use crate::error::ServerError;

/// GET /api/alerts
pub async fn list_active_alerts(
	State(state): State<AppState>,
) -> Result<Json<Vec<Alert>>, ServerError> {
	Ok(Json(state.engine.get_active_alerts().await?))
}

/// GET /api/monitors/{tracking_number}/alerts
pub async fn shipment_alerts(
	State(state): State<AppState>,
	Path(tracking_number): Path<String>,
) -> Result<Json<Vec<Alert>>, ServerError> {
	Ok(Json(state.engine.get_shipment_alerts(&tracking_number).await?))
}

/// POST /api/alerts/{id}/resolve
pub async fn resolve_alert(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Alert>, ServerError> {
	let id: AlertId = id
		.parse()
		.map_err(|_| ServerError::BadRequest(format!("invalid alert id '{id}'")))?;
	Ok(Json(state.engine.resolve_alert(id).await?))
}
