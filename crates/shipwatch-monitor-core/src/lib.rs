// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Shipwatch shipment monitoring engine.
//!
//! This crate holds everything that does not need I/O:
//! - Persisted records: [`ShipmentMonitor`], [`StatusHistoryEntry`], [`Alert`]
//! - The normalized carrier observation, [`TrackingStatus`]
//! - The evaluation context shared by the poll and webhook paths, [`MonitorContext`]
//! - The pure status evaluator, [`evaluate`]

pub mod alert;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod monitor;
pub mod status;

pub use alert::{Alert, AlertId, AlertSeverity, AlertType, NewAlert, HIGH_SEVERITY_DELAY_HOURS};
pub use error::{MonitorCoreError, Result};
pub use evaluator::{evaluate, parse_timestamp, Evaluation};
pub use history::{NewHistoryEntry, StatusHistoryEntry};
pub use monitor::{
	MonitorContext, ShipmentMonitor, DEFAULT_CHECK_INTERVAL_MINUTES, DEFAULT_DELAY_THRESHOLD_HOURS,
};
pub use status::TrackingStatus;
