// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Poll loop control.

use axum::{extract::State, Json};
use shipwatch_server_monitor::{CycleReport, EngineStatus};

use crate::api::AppState;
use crate::error::ServerError;

/// GET /api/monitor/status
pub async fn engine_status(
	State(state): State<AppState>,
) -> Result<Json<EngineStatus>, ServerError> {
	Ok(Json(state.engine.status().await?))
}

/// POST /api/monitor/start
pub async fn start_monitoring(
	State(state): State<AppState>,
) -> Result<Json<EngineStatus>, ServerError> {
	state.engine.start().await?;
	Ok(Json(state.engine.status().await?))
}

/// POST /api/monitor/stop
///
/// Returns once in-flight checks have finished or been abandoned.
pub async fn stop_monitoring(
	State(state): State<AppState>,
) -> Result<Json<EngineStatus>, ServerError> {
	state.engine.stop().await?;
	Ok(Json(state.engine.status().await?))
}

/// POST /api/monitor/cycle
pub async fn run_cycle(State(state): State<AppState>) -> Result<Json<CycleReport>, ServerError> {
	Ok(Json(state.engine.run_cycle().await?))
}
