// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

use crate::sections::{
	CarriersConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer,
	MonitorConfigLayer, WebhookConfigLayer,
};

/// One source's view of the configuration. Absent sections and fields defer
/// to lower-precedence sources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub monitor: Option<MonitorConfigLayer>,
	#[serde(default)]
	pub carriers: Option<CarriersConfigLayer>,
	#[serde(default)]
	pub webhook: Option<WebhookConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	let Some(other) = other else {
		return;
	};
	if let Some(existing) = base.as_mut() {
		merge(existing, other);
	} else {
		*base = Some(other);
	}
}

impl ServerConfigLayer {
	/// Overlay `other` on top of `self`.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.monitor, other.monitor, MonitorConfigLayer::merge);
		merge_section(&mut self.carriers, other.carriers, CarriersConfigLayer::merge);
		merge_section(&mut self.webhook, other.webhook, WebhookConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}
