// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracking provider abstraction and carrier routing.

use async_trait::async_trait;
use serde::Deserialize;
use shipwatch_monitor_core::TrackingStatus;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::error::ProviderError;

/// A carrier tracking API client.
///
/// Implementations return a typed error for every failure and never panic.
#[async_trait]
pub trait TrackingProvider: Send + Sync {
	/// Carrier name this provider serves, e.g. `naqel`.
	fn carrier(&self) -> &str;

	async fn track(&self, tracking_number: &str) -> Result<TrackingStatus, ProviderError>;
}

/// Providers keyed by lowercase carrier name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
	providers: HashMap<String, Arc<dyn TrackingProvider>>,
}

impl ProviderRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a provider, replacing any previous one for the same carrier.
	pub fn register(&mut self, provider: Arc<dyn TrackingProvider>) {
		let key = provider.carrier().to_lowercase();
		self.providers.insert(key, provider);
	}

	pub fn with_provider(mut self, provider: Arc<dyn TrackingProvider>) -> Self {
		self.register(provider);
		self
	}

	pub fn get(&self, carrier: &str) -> Option<&Arc<dyn TrackingProvider>> {
		self.providers.get(&carrier.to_lowercase())
	}

	pub fn carriers(&self) -> Vec<String> {
		let mut carriers: Vec<_> = self.providers.keys().cloned().collect();
		carriers.sort();
		carriers
	}

	pub fn is_empty(&self) -> bool {
		self.providers.is_empty()
	}

	/// Route to the carrier's provider.
	pub async fn track(
		&self,
		carrier: &str,
		tracking_number: &str,
	) -> Result<TrackingStatus, ProviderError> {
		let provider = self
			.get(carrier)
			.ok_or_else(|| ProviderError::UnsupportedCarrier(carrier.to_string()))?;
		provider.track(tracking_number).await
	}
}

/// Provider for carriers fronted by a JSON tracking endpoint.
///
/// Issues `GET {base_url}/track/{tracking_number}` and expects a normalized
/// body: `{status, location, estimated_delivery?, carrier?, last_updated?}`.
pub struct HttpTrackingProvider {
	carrier: String,
	base_url: reqwest::Url,
	api_key: Option<String>,
	client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
	status: String,
	#[serde(default, alias = "current_location")]
	location: String,
	#[serde(default)]
	estimated_delivery: Option<String>,
	#[serde(default)]
	carrier: Option<String>,
	#[serde(default)]
	last_updated: Option<String>,
}

impl HttpTrackingProvider {
	pub fn new(
		carrier: impl Into<String>,
		base_url: impl Into<String>,
		api_key: Option<String>,
		timeout: Duration,
	) -> Result<Self, ProviderError> {
		let base_url: String = base_url.into();
		let base_url = reqwest::Url::parse(&base_url)
			.map_err(|e| ProviderError::Network(format!("invalid base URL '{base_url}': {e}")))?;
		if base_url.cannot_be_a_base() {
			return Err(ProviderError::Network(format!(
				"invalid base URL '{base_url}': not a hierarchical URL"
			)));
		}

		let client = reqwest::Client::builder()
			.user_agent(concat!("shipwatch/", env!("CARGO_PKG_VERSION")))
			.timeout(timeout)
			.build()
			.map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {e}")))?;

		Ok(Self {
			carrier: carrier.into(),
			base_url,
			api_key,
			client,
		})
	}

	/// `{base_url}/track/{tracking_number}`, with the tracking number encoded
	/// as a single path segment.
	fn track_url(&self, tracking_number: &str) -> Result<reqwest::Url, ProviderError> {
		let mut url = self.base_url.clone();
		url
			.path_segments_mut()
			.map_err(|_| ProviderError::Network(format!("invalid base URL '{}'", self.base_url)))?
			.pop_if_empty()
			.push("track")
			.push(tracking_number);
		Ok(url)
	}
}

#[async_trait]
impl TrackingProvider for HttpTrackingProvider {
	fn carrier(&self) -> &str {
		&self.carrier
	}

	#[instrument(skip(self), fields(carrier = %self.carrier))]
	async fn track(&self, tracking_number: &str) -> Result<TrackingStatus, ProviderError> {
		let url = self.track_url(tracking_number)?;

		let mut request = self.client.get(url);
		if let Some(key) = &self.api_key {
			request = request.bearer_auth(key);
		}

		let response = request.send().await?;
		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(ProviderError::Carrier {
				status: status.as_u16(),
				message,
			});
		}

		let body: TrackResponse = response.json().await?;
		if body.status.trim().is_empty() {
			return Err(ProviderError::InvalidResponse("empty status".to_string()));
		}

		Ok(TrackingStatus {
			tracking_number: tracking_number.to_string(),
			carrier: body.carrier.unwrap_or_else(|| self.carrier.clone()),
			status: body.status,
			location: body.location,
			estimated_delivery: body.estimated_delivery,
			last_updated: body.last_updated,
		})
	}
}
