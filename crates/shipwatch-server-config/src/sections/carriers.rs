// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Carrier tracking endpoints, one table per carrier:
//!
//! ```toml
//! [carriers.naqel]
//! base_url = "https://tracking.naqel.example/api"
//! api_key = "..."
//! timeout_secs = 15
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_CARRIER_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, PartialEq)]
pub struct CarrierConfig {
	/// Lowercase carrier name, matched against each monitor's carrier.
	pub name: String,
	pub base_url: String,
	pub api_key: Option<String>,
	pub timeout_secs: u64,
}

impl CarrierConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}
}

impl fmt::Debug for CarrierConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CarrierConfig")
			.field("name", &self.name)
			.field("base_url", &self.base_url)
			.field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
			.field("timeout_secs", &self.timeout_secs)
			.finish()
	}
}

#[derive(Clone, Default, Deserialize)]
pub struct CarrierConfigLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
}

impl fmt::Debug for CarrierConfigLayer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CarrierConfigLayer")
			.field("base_url", &self.base_url)
			.field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
			.field("timeout_secs", &self.timeout_secs)
			.finish()
	}
}

impl CarrierConfigLayer {
	pub fn merge(&mut self, other: CarrierConfigLayer) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.api_key.is_some() {
			self.api_key = other.api_key;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
	}

	fn finalize(self, name: String) -> Result<CarrierConfig, ConfigError> {
		let base_url = self
			.base_url
			.filter(|url| !url.trim().is_empty())
			.ok_or_else(|| ConfigError::InvalidValue {
				key: format!("carriers.{name}.base_url"),
				message: "carrier has no base_url".to_string(),
			})?;

		Ok(CarrierConfig {
			name,
			base_url: base_url.trim_end_matches('/').to_string(),
			api_key: self.api_key.filter(|key| !key.is_empty()),
			timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_CARRIER_TIMEOUT_SECS),
		})
	}
}

/// All configured carriers, keyed by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CarriersConfigLayer {
	pub carriers: BTreeMap<String, CarrierConfigLayer>,
}

impl CarriersConfigLayer {
	pub fn merge(&mut self, other: CarriersConfigLayer) {
		for (name, layer) in other.carriers {
			self
				.carriers
				.entry(name.to_lowercase())
				.or_default()
				.merge(layer);
		}
	}

	pub fn finalize(self) -> Result<Vec<CarrierConfig>, ConfigError> {
		let mut merged: BTreeMap<String, CarrierConfigLayer> = BTreeMap::new();
		for (name, layer) in self.carriers {
			merged.entry(name.to_lowercase()).or_default().merge(layer);
		}
		merged
			.into_iter()
			.map(|(name, layer)| layer.finalize(name))
			.collect()
	}
}
