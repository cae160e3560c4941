// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for core monitoring types.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, MonitorCoreError>;

/// Errors raised while building or decoding core records.
#[derive(Debug, Error)]
pub enum MonitorCoreError {
	#[error("missing tracking number")]
	MissingTrackingNumber,

	#[error("unknown alert type: {0}")]
	UnknownAlertType(String),

	#[error("unknown alert severity: {0}")]
	UnknownSeverity(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}
