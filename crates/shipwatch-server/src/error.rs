// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::{Deserialize, Serialize};
use shipwatch_server_db::DbError;
use shipwatch_server_monitor::MonitorError;
use thiserror::Error;

/// JSON error body returned by the management API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

#[derive(Debug, Error)]
pub enum ServerError {
	#[error(transparent)]
	Monitor(#[from] MonitorError),

	#[error("{0}")]
	NotFound(String),

	#[error("{0}")]
	BadRequest(String),
}

impl ServerError {
	fn status_and_code(&self) -> (StatusCode, &'static str) {
		match self {
			ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
			ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
			ServerError::Monitor(MonitorError::Validation(_)) => {
				(StatusCode::BAD_REQUEST, "validation_error")
			}
			ServerError::Monitor(MonitorError::AlreadyRunning | MonitorError::NotRunning) => {
				(StatusCode::CONFLICT, "conflict")
			}
			ServerError::Monitor(MonitorError::Persistence(DbError::NotFound(_))) => {
				(StatusCode::NOT_FOUND, "not_found")
			}
			ServerError::Monitor(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, code) = self.status_and_code();
		let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
			tracing::error!(error = %self, "request failed");
			"internal server error".to_string()
		} else {
			self.to_string()
		};

		(
			status,
			Json(ErrorResponse {
				error: code.to_string(),
				message,
			}),
		)
			.into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_mapping() {
		let cases = [
			(ServerError::NotFound("x".into()), StatusCode::NOT_FOUND),
			(
				ServerError::Monitor(MonitorError::Validation("bad".into())),
				StatusCode::BAD_REQUEST,
			),
			(
				ServerError::Monitor(MonitorError::AlreadyRunning),
				StatusCode::CONFLICT,
			),
			(
				ServerError::Monitor(MonitorError::Persistence(DbError::NotFound("alert 9".into()))),
				StatusCode::NOT_FOUND,
			),
			(
				ServerError::Monitor(MonitorError::Persistence(DbError::Internal("boom".into()))),
				StatusCode::INTERNAL_SERVER_ERROR,
			),
		];

		for (error, expected) in cases {
			assert_eq!(error.into_response().status(), expected);
		}
	}
}
