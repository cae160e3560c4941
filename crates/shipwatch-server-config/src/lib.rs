// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Shipwatch server.
//!
//! Resolved from layered sources, highest precedence first:
//! 1. Environment variables (`SHIPWATCH_*`, plus a few legacy names)
//! 2. Config file (`/etc/shipwatch/server.toml` or `--config`)
//! 3. Built-in defaults
//!
//! ```ignore
//! let config = shipwatch_server_config::load_config_with_file("shipwatch.toml")?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub monitor: MonitorConfig,
	pub carriers: Vec<CarrierConfig>,
	pub webhook: WebhookConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load from defaults, `/etc/shipwatch/server.toml` and the environment.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::new()),
	])
}

/// Load with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::new()),
	])
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let monitor = layer.monitor.unwrap_or_default().finalize();
	let carriers = layer.carriers.unwrap_or_default().finalize()?;
	let webhook = layer.webhook.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_monitor(&monitor)?;

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		check_interval_minutes = monitor.check_interval_minutes,
		delay_threshold_hours = monitor.delay_threshold_hours,
		max_workers = monitor.max_workers,
		carriers = carriers.len(),
		webhook_signatures = webhook.secret.is_some(),
		"server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		monitor,
		carriers,
		webhook,
		logging,
	})
}

fn validate_monitor(monitor: &MonitorConfig) -> Result<(), ConfigError> {
	if monitor.max_workers == 0 {
		return Err(ConfigError::Validation(
			"monitor.max_workers must be at least 1".to_string(),
		));
	}
	if monitor.check_interval_minutes == 0 {
		return Err(ConfigError::Validation(
			"monitor.check_interval_minutes must be at least 1".to_string(),
		));
	}
	if !monitor.delay_threshold_hours.is_finite() || monitor.delay_threshold_hours < 0.0 {
		return Err(ConfigError::Validation(
			"monitor.delay_threshold_hours must be a non-negative number".to_string(),
		));
	}
	if monitor.task_timeout_secs == 0 {
		return Err(ConfigError::Validation(
			"monitor.task_timeout_secs must be at least 1".to_string(),
		));
	}
	Ok(())
}
