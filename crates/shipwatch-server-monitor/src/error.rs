// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use shipwatch_monitor_core::MonitorCoreError;
use shipwatch_server_db::DbError;
use thiserror::Error;

/// Failure fetching status from a carrier. Always retryable on the next cycle.
#[derive(Debug, Error)]
pub enum ProviderError {
	#[error("network error: {0}")]
	Network(String),

	#[error("carrier returned {status}: {message}")]
	Carrier { status: u16, message: String },

	#[error("unsupported carrier: {0}")]
	UnsupportedCarrier(String),

	#[error("invalid carrier response: {0}")]
	InvalidResponse(String),

	#[error("carrier request timed out")]
	Timeout,
}

impl From<reqwest::Error> for ProviderError {
	fn from(e: reqwest::Error) -> Self {
		if e.is_timeout() {
			ProviderError::Timeout
		} else if e.is_decode() {
			ProviderError::InvalidResponse(e.to_string())
		} else {
			ProviderError::Network(e.to_string())
		}
	}
}

#[derive(Debug, Error)]
pub enum MonitorError {
	#[error("validation error: {0}")]
	Validation(String),

	#[error("persistence error: {0}")]
	Persistence(#[from] DbError),

	#[error("provider error: {0}")]
	Provider(#[from] ProviderError),

	#[error("monitoring is already running")]
	AlreadyRunning,

	#[error("monitoring is not running")]
	NotRunning,
}

impl From<MonitorCoreError> for MonitorError {
	fn from(e: MonitorCoreError) -> Self {
		match e {
			MonitorCoreError::Serialization(e) => MonitorError::Persistence(DbError::Serialization(e)),
			other => MonitorError::Validation(other.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, MonitorError>;
