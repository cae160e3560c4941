// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Carrier push endpoint.

use axum::{
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::IntoResponse,
	Json,
};
use shipwatch_common_webhook::{verify_signature_header, SIGNATURE_HEADER};
use shipwatch_server_monitor::{MonitorError, WebhookPayload, WebhookResponse};
use tracing::{error, instrument, warn};

use crate::api::AppState;

/// POST /api/webhooks/carrier
///
/// 200 when processed, 400 for a malformed or incomplete body, 401 for a bad
/// signature and 500 when processing fails after validation.
#[instrument(skip_all)]
pub async fn carrier_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> impl IntoResponse {
	if let Some(secret) = &state.webhook_secret {
		let signature = headers
			.get(SIGNATURE_HEADER)
			.and_then(|v| v.to_str().ok())
			.unwrap_or_default();
		if !verify_signature_header(secret, &body, signature) {
			warn!("rejected webhook with invalid signature");
			return (
				StatusCode::UNAUTHORIZED,
				Json(WebhookResponse::rejected("invalid signature")),
			);
		}
	}

	let payload: WebhookPayload = match serde_json::from_slice(&body) {
		Ok(payload) => payload,
		Err(e) => {
			return (
				StatusCode::BAD_REQUEST,
				Json(WebhookResponse::rejected(format!("invalid JSON body: {e}"))),
			);
		}
	};

	let result = state.engine.handle_webhook(payload).await;
	let status = match &result {
		Ok(_) => StatusCode::OK,
		Err(MonitorError::Validation(_)) => StatusCode::BAD_REQUEST,
		Err(e) => {
			error!(error = %e, "webhook processing failed");
			StatusCode::INTERNAL_SERVER_ERROR
		}
	};

	(status, Json(WebhookResponse::from_result(&result)))
}
