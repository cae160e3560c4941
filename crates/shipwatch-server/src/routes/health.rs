// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::api::AppState;
use crate::version::VERSION;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub database: bool,
	pub monitoring: bool,
	pub version: &'static str,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
		Ok(_) => true,
		Err(e) => {
			tracing::warn!(error = %e, "database health check failed");
			false
		}
	};
	let monitoring = state.engine.is_running().await;

	let status = if database {
		StatusCode::OK
	} else {
		StatusCode::SERVICE_UNAVAILABLE
	};

	(
		status,
		Json(HealthResponse {
			status: if database { "healthy" } else { "unhealthy" },
			database,
			monitoring,
			version: VERSION,
		}),
	)
}
