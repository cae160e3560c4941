// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file and environment variables.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	CarrierConfigLayer, CarriersConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LogFormat,
	LoggingConfigLayer, MonitorConfigLayer, WebhookConfigLayer,
};

/// Default config file location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/shipwatch/server.toml";

const CARRIER_PREFIX: &str = "SHIPWATCH_CARRIER_";

/// Source precedence levels (higher overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `SHIPWATCH_<SECTION>_<FIELD>`. A few unprefixed names from
/// older deployments are still read when the prefixed one is unset.
/// Secrets may also be given as `<NAME>_FILE` pointing at a file.
#[derive(Default)]
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Read from the process environment.
	pub fn new() -> Self {
		Self::default()
	}

	/// Read from a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars
					.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	fn snapshot(&self) -> Env {
		match &self.vars {
			Some(vars) => Env { vars: vars.clone() },
			None => Env {
				vars: std::env::vars().collect(),
			},
		}
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let env = self.snapshot();
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env(&env)?),
			database: Some(load_database_from_env(&env)),
			monitor: Some(load_monitor_from_env(&env)?),
			carriers: Some(load_carriers_from_env(&env)?),
			webhook: Some(load_webhook_from_env(&env)?),
			logging: Some(load_logging_from_env(&env)?),
		})
	}
}

struct Env {
	vars: HashMap<String, String>,
}

impl Env {
	fn var(&self, name: &str) -> Option<String> {
		self.vars.get(name).filter(|s| !s.is_empty()).cloned()
	}

	/// First of `names` that is set.
	fn var_any(&self, names: &[&str]) -> Option<(String, String)> {
		names
			.iter()
			.find_map(|name| self.var(name).map(|v| (name.to_string(), v)))
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self
			.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parse<T: FromStr>(&self, names: &[&str], kind: &str) -> Result<Option<T>, ConfigError> {
		match self.var_any(names) {
			Some((key, v)) => v.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key,
				message: format!("invalid {kind} value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	/// `name`, or the trimmed contents of the file named by `name_FILE`.
	fn secret(&self, name: &str) -> Result<Option<String>, ConfigError> {
		if let Some(value) = self.var(name) {
			return Ok(Some(value));
		}
		let Some(path) = self.var(&format!("{name}_FILE")) else {
			return Ok(None);
		};
		let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
			path: PathBuf::from(&path),
			source: e,
		})?;
		Ok(Some(content.trim().to_string()).filter(|s| !s.is_empty()))
	}
}

fn load_http_from_env(env: &Env) -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env.var("SHIPWATCH_SERVER_HOST"),
		port: env.parse(&["SHIPWATCH_SERVER_PORT"], "u16")?,
	})
}

fn load_database_from_env(env: &Env) -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env.var("SHIPWATCH_SERVER_DATABASE_URL"),
	}
}

fn load_monitor_from_env(env: &Env) -> Result<MonitorConfigLayer, ConfigError> {
	Ok(MonitorConfigLayer {
		check_interval_minutes: env.parse(
			&["SHIPWATCH_MONITOR_CHECK_INTERVAL_MINUTES", "MONITOR_CHECK_INTERVAL"],
			"u32",
		)?,
		delay_threshold_hours: env.parse(
			&["SHIPWATCH_MONITOR_DELAY_THRESHOLD_HOURS", "DELAY_THRESHOLD_HOURS"],
			"f64",
		)?,
		max_workers: env.parse(
			&["SHIPWATCH_MONITOR_MAX_WORKERS", "MONITOR_MAX_WORKERS"],
			"usize",
		)?,
		task_timeout_secs: env.parse(&["SHIPWATCH_MONITOR_TASK_TIMEOUT_SECS"], "u64")?,
		shutdown_grace_secs: env.parse(&["SHIPWATCH_MONITOR_SHUTDOWN_GRACE_SECS"], "u64")?,
		error_backoff_secs: env.parse(&["SHIPWATCH_MONITOR_ERROR_BACKOFF_SECS"], "u64")?,
		autostart: env.bool("SHIPWATCH_MONITOR_AUTOSTART"),
	})
}

/// `SHIPWATCH_CARRIER_<NAME>_URL`, `_API_KEY` and `_TIMEOUT_SECS`.
fn load_carriers_from_env(env: &Env) -> Result<CarriersConfigLayer, ConfigError> {
	let mut layer = CarriersConfigLayer::default();

	let mut names: Vec<String> = env
		.vars
		.keys()
		.filter_map(|key| key.strip_prefix(CARRIER_PREFIX))
		.filter_map(|rest| {
			["_URL", "_API_KEY", "_API_KEY_FILE", "_TIMEOUT_SECS"]
				.iter()
				.find_map(|suffix| rest.strip_suffix(suffix))
		})
		.filter(|name| !name.is_empty())
		.map(str::to_string)
		.collect();
	names.sort();
	names.dedup();

	for name in names {
		let var = |field: &str| format!("{CARRIER_PREFIX}{name}_{field}");
		let carrier = CarrierConfigLayer {
			base_url: env.var(&var("URL")),
			api_key: env.secret(&var("API_KEY"))?,
			timeout_secs: env.parse(&[var("TIMEOUT_SECS").as_str()], "u64")?,
		};
		layer.carriers.insert(name.to_lowercase(), carrier);
	}

	Ok(layer)
}

fn load_webhook_from_env(env: &Env) -> Result<WebhookConfigLayer, ConfigError> {
	Ok(WebhookConfigLayer {
		secret: env.secret("SHIPWATCH_WEBHOOK_SECRET")?,
		callback_signing_secret: env.secret("SHIPWATCH_CALLBACK_SIGNING_SECRET")?,
	})
}

fn load_logging_from_env(env: &Env) -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env.var("SHIPWATCH_LOG_FORMAT") {
		Some(v) => Some(v.parse::<LogFormat>().map_err(|message| ConfigError::InvalidValue {
			key: "SHIPWATCH_LOG_FORMAT".to_string(),
			message,
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env.var("SHIPWATCH_LOG_LEVEL"),
		format,
	})
}
