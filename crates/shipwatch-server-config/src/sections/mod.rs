// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a resolved form and a partial `*Layer`
//! form used while merging sources.

mod carriers;
mod database;
mod http;
mod logging;
mod monitor;
mod webhook;

pub use carriers::{CarrierConfig, CarrierConfigLayer, CarriersConfigLayer, DEFAULT_CARRIER_TIMEOUT_SECS};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use monitor::{MonitorConfig, MonitorConfigLayer};
pub use webhook::{WebhookConfig, WebhookConfigLayer};
