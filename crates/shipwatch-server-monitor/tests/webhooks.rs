// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod common;

use common::{engine_with, fast_settings, Counters, Script, ScriptedProvider};
use shipwatch_server_monitor::WebhookPayload;

fn payload(value: serde_json::Value) -> WebhookPayload {
	serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_webhook_updates_monitored_shipment() {
	let engine = engine_with(ScriptedProvider::new("naqel"), fast_settings()).await;
	let counters = Counters::attach(&engine);

	engine
		.add_monitor(engine.new_monitor("NQ1", "naqel").with_status("in_transit"))
		.await
		.unwrap();

	let outcome = engine
		.handle_webhook(payload(serde_json::json!({
			"tracking_number": "NQ1",
			"carrier": "naqel",
			"status": "delivered",
			"location": "Jeddah",
		})))
		.await
		.unwrap();

	assert!(outcome.persisted);
	assert!(outcome.evaluation.transitioned);
	assert!(outcome.evaluation.delivered);
	assert_eq!(counters.status_change(), 1);
	assert_eq!(counters.delivery(), 1);

	let monitor = engine.get_monitor("NQ1").await.unwrap().unwrap();
	assert!(!monitor.active);
	assert_eq!(monitor.last_known_status, "delivered");

	let history = engine.get_shipment_history("NQ1").await.unwrap();
	assert_eq!(history.len(), 1);
	assert_eq!(history[0].status, "delivered");
	assert_eq!(history[0].location, "Jeddah");
}

#[tokio::test]
async fn test_webhook_for_unmonitored_shipment_is_not_persisted() {
	let engine = engine_with(ScriptedProvider::new("naqel"), fast_settings()).await;
	let counters = Counters::attach(&engine);

	let outcome = engine
		.handle_webhook(payload(serde_json::json!({
			"tracking_number": "AX9",
			"status": "in_transit",
			"previous_status": "in_transit",
		})))
		.await
		.unwrap();

	assert!(!outcome.persisted);
	assert!(!outcome.evaluation.transitioned);
	assert_eq!(counters.status_change(), 0);

	assert!(engine.get_monitor("AX9").await.unwrap().is_none());
	let history = engine.get_shipment_history("AX9").await.unwrap();
	assert_eq!(history.len(), 1);
	assert_eq!(history[0].carrier, "unknown");
}

#[tokio::test]
async fn test_webhook_for_unmonitored_overdue_shipment_raises_alert() {
	let engine = engine_with(ScriptedProvider::new("naqel"), fast_settings()).await;

	let eta = (chrono::Utc::now() - chrono::Duration::hours(10)).to_rfc3339();
	let outcome = engine
		.handle_webhook(payload(serde_json::json!({
			"trackingNumber": "AX10",
			"carrier": "aramex",
			"status": "in_transit",
			"estimatedDelivery": eta,
		})))
		.await
		.unwrap();

	assert!(outcome.evaluation.delayed);
	assert!(outcome.alert_created);
	let alerts = engine.get_shipment_alerts("AX10").await.unwrap();
	assert_eq!(alerts.len(), 1);
	assert!(engine.get_monitor("AX10").await.unwrap().is_none());
}

#[tokio::test]
async fn test_webhook_for_removed_monitor_leaves_it_untouched() {
	let engine = engine_with(ScriptedProvider::new("naqel"), fast_settings()).await;

	engine
		.add_monitor(engine.new_monitor("NQ5", "naqel").with_status("in_transit"))
		.await
		.unwrap();
	assert!(engine.remove_monitor("NQ5").await.unwrap());
	assert!(!engine.remove_monitor("NQ5").await.unwrap());

	let outcome = engine
		.handle_webhook(payload(serde_json::json!({
			"tracking_number": "NQ5",
			"status": "out_for_delivery",
		})))
		.await
		.unwrap();

	assert!(!outcome.persisted);
	assert!(outcome.evaluation.transitioned);
	let monitor = engine.get_monitor("NQ5").await.unwrap().unwrap();
	assert!(!monitor.active);
	assert_eq!(monitor.last_known_status, "in_transit");
}

#[tokio::test]
async fn test_webhook_without_status_keeps_known_status() {
	let provider = ScriptedProvider::new("naqel");
	let engine = engine_with(provider.clone(), fast_settings()).await;
	let counters = Counters::attach(&engine);

	engine
		.add_monitor(engine.new_monitor("NQ1", "naqel").with_status("in_transit"))
		.await
		.unwrap();

	let outcome = engine
		.handle_webhook(payload(serde_json::json!({
			"tracking_number": "NQ1",
			"location": "Riyadh",
		})))
		.await
		.unwrap();

	assert!(outcome.persisted);
	assert!(!outcome.evaluation.transitioned);
	assert_eq!(counters.status_change(), 0);
	let monitor = engine.get_monitor("NQ1").await.unwrap().unwrap();
	assert!(monitor.active);
	assert_eq!(monitor.last_known_status, "in_transit");

	provider.set("NQ1", Script::status("in_transit"));
	let report = engine.run_cycle().await.unwrap();
	assert_eq!(report.succeeded, 1);
	assert_eq!(counters.status_change(), 0);

	let statuses: Vec<_> = engine
		.get_shipment_history("NQ1")
		.await
		.unwrap()
		.into_iter()
		.map(|entry| entry.status)
		.collect();
	assert_eq!(statuses, vec!["in_transit", "in_transit"]);
}

#[tokio::test]
async fn test_webhook_with_blank_status_for_unmonitored_shipment_uses_previous_status() {
	let engine = engine_with(ScriptedProvider::new("naqel"), fast_settings()).await;
	let counters = Counters::attach(&engine);

	let outcome = engine
		.handle_webhook(payload(serde_json::json!({
			"tracking_number": "AX2",
			"status": " ",
			"previous_status": "out_for_delivery",
		})))
		.await
		.unwrap();

	assert!(!outcome.evaluation.transitioned);
	assert_eq!(counters.status_change(), 0);
	let history = engine.get_shipment_history("AX2").await.unwrap();
	assert_eq!(history[0].status, "out_for_delivery");
}
