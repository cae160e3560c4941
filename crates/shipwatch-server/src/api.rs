// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	routing::{get, post},
	Router,
};
use shipwatch_server_monitor::MonitorEngine;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::routes;

#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<MonitorEngine>,
	pub pool: SqlitePool,
	/// Inbound webhooks must be signed with this when set.
	pub webhook_secret: Option<Arc<[u8]>>,
}

impl AppState {
	pub fn new(engine: Arc<MonitorEngine>, pool: SqlitePool, webhook_secret: Option<String>) -> Self {
		Self {
			engine,
			pool,
			webhook_secret: webhook_secret.map(|s| Arc::from(s.into_bytes())),
		}
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/api/webhooks/carrier", post(routes::webhooks::carrier_webhook))
		.route(
			"/api/monitors",
			get(routes::monitors::list_monitors).post(routes::monitors::create_monitor),
		)
		.route(
			"/api/monitors/{tracking_number}",
			get(routes::monitors::get_monitor).delete(routes::monitors::delete_monitor),
		)
		.route(
			"/api/monitors/{tracking_number}/history",
			get(routes::monitors::get_history),
		)
		.route(
			"/api/monitors/{tracking_number}/alerts",
			get(routes::alerts::shipment_alerts),
		)
		.route("/api/alerts", get(routes::alerts::list_active_alerts))
		.route("/api/alerts/{id}/resolve", post(routes::alerts::resolve_alert))
		.route("/api/monitor/status", get(routes::engine::engine_status))
		.route("/api/monitor/start", post(routes::engine::start_monitoring))
		.route("/api/monitor/stop", post(routes::engine::stop_monitoring))
		.route("/api/monitor/cycle", post(routes::engine::run_cycle))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
