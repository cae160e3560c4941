// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for the Shipwatch monitoring engine.
//!
//! Every [`MonitorStore`] call is a single statement, so concurrent poll
//! tasks and webhook requests can share one pool without extra locking.

pub mod error;
pub mod pool;
pub mod schema;
pub mod store;
pub mod testing;

pub use error::{DbError, Result};
pub use pool::create_pool;
pub use schema::run_migrations;
pub use store::{AlertRecord, MonitorStore, SqliteMonitorStore};
