// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Listener registration and isolated dispatch.

use shipwatch_monitor_core::{ShipmentMonitor, TrackingStatus};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Called with the monitor, hours past the estimated delivery, and the observation.
pub type DelayCallback =
	Arc<dyn Fn(&ShipmentMonitor, f64, &TrackingStatus) -> anyhow::Result<()> + Send + Sync>;

/// Called with the monitor as it was before the change, the new status, and the observation.
pub type StatusChangeCallback =
	Arc<dyn Fn(&ShipmentMonitor, &str, &TrackingStatus) -> anyhow::Result<()> + Send + Sync>;

/// Called once when a shipment transitions into a delivered status.
pub type DeliveryCallback =
	Arc<dyn Fn(&ShipmentMonitor, &TrackingStatus) -> anyhow::Result<()> + Send + Sync>;

/// Event kinds listeners can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackEvent {
	Delay,
	StatusChange,
	Delivery,
}

impl CallbackEvent {
	pub fn as_str(&self) -> &'static str {
		match self {
			CallbackEvent::Delay => "delay",
			CallbackEvent::StatusChange => "status_change",
			CallbackEvent::Delivery => "delivery",
		}
	}
}

/// Per-engine listener lists.
///
/// Every handler runs even if an earlier one returns an error or panics;
/// failures are logged with the shipment attached.
#[derive(Default)]
pub struct CallbackRegistry {
	delay: RwLock<Vec<DelayCallback>>,
	status_change: RwLock<Vec<StatusChangeCallback>>,
	delivery: RwLock<Vec<DeliveryCallback>>,
}

impl CallbackRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register_delay<F>(&self, callback: F)
	where
		F: Fn(&ShipmentMonitor, f64, &TrackingStatus) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		write(&self.delay).push(Arc::new(callback));
	}

	pub fn register_status_change<F>(&self, callback: F)
	where
		F: Fn(&ShipmentMonitor, &str, &TrackingStatus) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		write(&self.status_change).push(Arc::new(callback));
	}

	pub fn register_delivery<F>(&self, callback: F)
	where
		F: Fn(&ShipmentMonitor, &TrackingStatus) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		write(&self.delivery).push(Arc::new(callback));
	}

	pub fn count(&self, event: CallbackEvent) -> usize {
		match event {
			CallbackEvent::Delay => read(&self.delay).len(),
			CallbackEvent::StatusChange => read(&self.status_change).len(),
			CallbackEvent::Delivery => read(&self.delivery).len(),
		}
	}

	/// Returns how many handlers failed.
	///
	/// Handlers are cloned out before running so a handler may register more listeners.
	pub fn dispatch_delay(
		&self,
		monitor: &ShipmentMonitor,
		delay_hours: f64,
		raw: &TrackingStatus,
	) -> usize {
		let handlers = read(&self.delay).clone();
		handlers
			.iter()
			.filter(|cb| {
				!run_isolated(CallbackEvent::Delay, &monitor.tracking_number, || {
					cb(monitor, delay_hours, raw)
				})
			})
			.count()
	}

	pub fn dispatch_status_change(
		&self,
		monitor: &ShipmentMonitor,
		new_status: &str,
		raw: &TrackingStatus,
	) -> usize {
		let handlers = read(&self.status_change).clone();
		handlers
			.iter()
			.filter(|cb| {
				!run_isolated(CallbackEvent::StatusChange, &monitor.tracking_number, || {
					cb(monitor, new_status, raw)
				})
			})
			.count()
	}

	pub fn dispatch_delivery(&self, monitor: &ShipmentMonitor, raw: &TrackingStatus) -> usize {
		let handlers = read(&self.delivery).clone();
		handlers
			.iter()
			.filter(|cb| {
				!run_isolated(CallbackEvent::Delivery, &monitor.tracking_number, || {
					cb(monitor, raw)
				})
			})
			.count()
	}
}

fn read<T>(lock: &RwLock<Vec<T>>) -> std::sync::RwLockReadGuard<'_, Vec<T>> {
	lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<Vec<T>>) -> std::sync::RwLockWriteGuard<'_, Vec<T>> {
	lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn run_isolated(
	event: CallbackEvent,
	tracking_number: &str,
	f: impl FnOnce() -> anyhow::Result<()>,
) -> bool {
	match catch_unwind(AssertUnwindSafe(f)) {
		Ok(Ok(())) => true,
		Ok(Err(e)) => {
			warn!(event = event.as_str(), tracking_number = %tracking_number, error = %e, "callback failed");
			false
		}
		Err(_) => {
			warn!(event = event.as_str(), tracking_number = %tracking_number, "callback panicked");
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn monitor() -> ShipmentMonitor {
		ShipmentMonitor::new("NQ1", "naqel")
	}

	fn raw() -> TrackingStatus {
		TrackingStatus::new("NQ1", "naqel", "in_transit")
	}

	#[test]
	fn test_failing_callbacks_do_not_stop_the_rest() {
		let registry = CallbackRegistry::new();
		let calls = Arc::new(AtomicUsize::new(0));

		registry.register_delay(|_, _, _| anyhow::bail!("listener down"));
		registry.register_delay(|_, _, _| panic!("listener bug"));
		let counter = calls.clone();
		registry.register_delay(move |m, hours, _| {
			assert_eq!(m.tracking_number, "NQ1");
			assert_eq!(hours, 6.0);
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		});

		let failed = registry.dispatch_delay(&monitor(), 6.0, &raw());
		assert_eq!(failed, 2);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_event_lists_are_separate() {
		let registry = CallbackRegistry::new();
		let seen = Arc::new(RwLock::new(Vec::<String>::new()));

		let s = seen.clone();
		registry.register_status_change(move |_, status, _| {
			s.write().unwrap().push(format!("change:{status}"));
			Ok(())
		});
		let s = seen.clone();
		registry.register_delivery(move |m, _| {
			s.write().unwrap().push(format!("delivered:{}", m.tracking_number));
			Ok(())
		});

		assert_eq!(registry.count(CallbackEvent::Delay), 0);
		assert_eq!(registry.count(CallbackEvent::StatusChange), 1);
		assert_eq!(registry.dispatch_delay(&monitor(), 1.0, &raw()), 0);
		registry.dispatch_status_change(&monitor(), "delivered", &raw());
		registry.dispatch_delivery(&monitor(), &raw());

		assert_eq!(
			*seen.read().unwrap(),
			vec!["change:delivered".to_string(), "delivered:NQ1".to_string()]
		);
	}
}
