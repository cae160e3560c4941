// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shipwatch HTTP server.
//!
//! Carrier webhook ingress, monitor and alert management, and control of the
//! background poll loop, all backed by one [`MonitorEngine`].

pub mod api;
pub mod bootstrap;
pub mod error;
pub mod routes;
pub mod version;

pub use api::{create_router, AppState};
pub use bootstrap::{build_engine, build_providers, engine_settings};
pub use error::{ErrorResponse, ServerError};
pub use shipwatch_server_config::ServerConfig;
pub use shipwatch_server_monitor::MonitorEngine;
