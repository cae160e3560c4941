// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shipment status monitoring engine.
//!
//! [`MonitorEngine`] ties together:
//! - [`ProviderRegistry`]: carrier tracking clients
//! - [`StatusPipeline`]: evaluation, alerting and history shared by polls and webhooks
//! - [`PollScheduler`]: the cancellable background loop and its bounded worker pool
//! - [`CallbackRegistry`]: per-engine delay, status change and delivery listeners
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(SqliteMonitorStore::new(pool));
//! let providers = ProviderRegistry::new().with_provider(Arc::new(naqel));
//! let engine = Arc::new(MonitorEngine::new(store, providers, EngineSettings::default()));
//!
//! engine.register_delay_callback(|monitor, hours, _raw| {
//!     tracing::warn!(tracking_number = %monitor.tracking_number, hours, "late");
//!     Ok(())
//! });
//! engine.start().await?;
//! ```

pub mod alerts;
pub mod callbacks;
pub mod engine;
pub mod error;
pub mod notifier;
pub mod pipeline;
pub mod provider;
pub mod scheduler;
pub mod webhook;

pub use alerts::AlertManager;
pub use callbacks::{
	CallbackEvent, CallbackRegistry, DelayCallback, DeliveryCallback, StatusChangeCallback,
};
pub use engine::{EngineSettings, EngineStatus, MonitorEngine};
pub use error::{MonitorError, ProviderError, Result};
pub use notifier::CallbackUrlNotifier;
pub use pipeline::{PollOutcome, StatusOutcome, StatusPipeline};
pub use provider::{HttpTrackingProvider, ProviderRegistry, TrackingProvider};
pub use scheduler::{CycleError, CycleReport, PollScheduler, SchedulerSettings};
pub use webhook::{WebhookPayload, WebhookResponse};
