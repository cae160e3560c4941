// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod common;

use common::{engine_with, fast_settings, Script, ScriptedProvider};
use shipwatch_server_monitor::MonitorError;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_start_stop_transitions() {
	let engine = engine_with(ScriptedProvider::new("naqel"), fast_settings()).await;

	assert!(!engine.is_running().await);
	assert!(matches!(engine.stop().await, Err(MonitorError::NotRunning)));

	engine.start().await.unwrap();
	assert!(engine.is_running().await);
	assert!(matches!(engine.start().await, Err(MonitorError::AlreadyRunning)));

	engine.stop().await.unwrap();
	assert!(!engine.is_running().await);
	assert!(matches!(engine.stop().await, Err(MonitorError::NotRunning)));

	// Restartable after a stop.
	engine.start().await.unwrap();
	engine.stop().await.unwrap();
}

#[tokio::test]
async fn test_running_loop_polls_on_its_interval() {
	let provider = ScriptedProvider::new("naqel");
	let engine = engine_with(provider.clone(), fast_settings()).await;

	engine
		.add_monitor(engine.new_monitor("NQ1", "naqel"))
		.await
		.unwrap();
	provider.set("NQ1", Script::status("in_transit"));

	engine.start().await.unwrap();
	let deadline = Instant::now() + Duration::from_secs(5);
	while engine.get_shipment_history("NQ1").await.unwrap().len() < 2 {
		assert!(Instant::now() < deadline, "loop never polled twice");
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	engine.stop().await.unwrap();

	let status = engine.status().await.unwrap();
	assert!(!status.running);
	assert_eq!(status.active_monitors, 1);
	assert_eq!(status.carriers, vec!["naqel".to_string()]);
	assert!(status.last_cycle.is_some());
}

#[tokio::test]
async fn test_stop_abandons_checks_after_grace_period() {
	let provider = ScriptedProvider::new("naqel");
	let mut settings = fast_settings();
	settings.scheduler.task_timeout = Duration::from_secs(60);
	settings.scheduler.shutdown_grace = Duration::from_millis(100);
	let engine = engine_with(provider.clone(), settings).await;

	engine
		.add_monitor(engine.new_monitor("SLOW", "naqel"))
		.await
		.unwrap();
	provider.set("SLOW", Script::Hang(Duration::from_secs(30)));

	engine.start().await.unwrap();
	let deadline = Instant::now() + Duration::from_secs(5);
	while provider.calls() == 0 {
		assert!(Instant::now() < deadline, "loop never dispatched the check");
		tokio::time::sleep(Duration::from_millis(10)).await;
	}

	let stopping = Instant::now();
	engine.stop().await.unwrap();
	assert!(stopping.elapsed() < Duration::from_secs(5));
	assert!(!engine.is_running().await);

	let report = engine.status().await.unwrap().last_cycle.unwrap();
	assert_eq!(report.abandoned, 1);
	assert!(engine.get_shipment_history("SLOW").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_monitor_validation() {
	let engine = engine_with(ScriptedProvider::new("naqel"), fast_settings()).await;

	assert!(matches!(
		engine.add_monitor(engine.new_monitor("  ", "naqel")).await,
		Err(MonitorError::Validation(_))
	));
	assert!(matches!(
		engine.add_monitor(engine.new_monitor("NQ1", "")).await,
		Err(MonitorError::Validation(_))
	));
	assert!(matches!(
		engine
			.add_monitor(engine.new_monitor("NQ1", "naqel").with_delay_threshold_hours(-1.0))
			.await,
		Err(MonitorError::Validation(_))
	));
	assert!(matches!(
		engine
			.add_monitor(engine.new_monitor("NQ1", "naqel").with_check_interval_minutes(0))
			.await,
		Err(MonitorError::Validation(_))
	));

	let stored = engine
		.add_monitor(engine.new_monitor(" NQ1 ", "naqel").with_reference("PO-7"))
		.await
		.unwrap();
	assert_eq!(stored.tracking_number, "NQ1");
	assert_eq!(stored.reference, "PO-7");
	assert_eq!(stored.delay_threshold_hours, 4.0);
	assert_eq!(stored.check_interval_minutes, 30);
	assert!(stored.active);
}

#[tokio::test]
async fn test_manual_cycle_shares_worker_limit_with_loop() {
	let provider = ScriptedProvider::new("naqel");
	let mut settings = fast_settings();
	settings.scheduler.max_workers = 2;
	let engine = engine_with(provider.clone(), settings).await;

	for i in 0..6 {
		let tracking_number = format!("NQ{i}");
		engine
			.add_monitor(engine.new_monitor(&tracking_number, "naqel"))
			.await
			.unwrap();
		provider.set(&tracking_number, Script::Hang(Duration::from_millis(100)));
	}

	engine.start().await.unwrap();
	let deadline = Instant::now() + Duration::from_secs(5);
	while provider.calls() == 0 {
		assert!(Instant::now() < deadline, "loop never dispatched a check");
		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	let report = engine.run_cycle().await.unwrap();
	engine.stop().await.unwrap();

	assert_eq!(report.checked, 6);
	assert!(
		provider.peak_concurrency() <= 2,
		"peak concurrency {} exceeded max_workers",
		provider.peak_concurrency()
	);
}

#[tokio::test]
async fn test_stop_cancels_overlapping_manual_cycle() {
	let provider = ScriptedProvider::new("naqel");
	let mut settings = fast_settings();
	settings.scheduler.shutdown_grace = Duration::from_millis(100);
	let engine = engine_with(provider.clone(), settings).await;

	engine
		.add_monitor(engine.new_monitor("SLOW", "naqel"))
		.await
		.unwrap();
	provider.set("SLOW", Script::Hang(Duration::from_secs(30)));

	engine.start().await.unwrap();
	let deadline = Instant::now() + Duration::from_secs(5);
	while provider.calls() == 0 {
		assert!(Instant::now() < deadline, "loop never dispatched the check");
		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	let manual = tokio::spawn({
		let engine = engine.clone();
		async move { engine.run_cycle().await }
	});
	while provider.calls() < 2 {
		assert!(Instant::now() < deadline, "manual cycle never dispatched the check");
		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	engine.stop().await.unwrap();
	let report = tokio::time::timeout(Duration::from_secs(5), manual)
		.await
		.expect("manual cycle outlived stop")
		.unwrap()
		.unwrap();
	assert_eq!(report.abandoned, 1);
}

#[tokio::test]
async fn test_start_waits_for_stopping_loop_to_drain() {
	let provider = ScriptedProvider::new("naqel");
	let mut settings = fast_settings();
	settings.scheduler.shutdown_grace = Duration::from_millis(300);
	let engine = engine_with(provider.clone(), settings).await;

	engine
		.add_monitor(engine.new_monitor("SLOW", "naqel"))
		.await
		.unwrap();
	provider.set("SLOW", Script::Hang(Duration::from_secs(30)));

	engine.start().await.unwrap();
	let deadline = Instant::now() + Duration::from_secs(5);
	while provider.calls() == 0 {
		assert!(Instant::now() < deadline, "loop never dispatched the check");
		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	let stopping = tokio::spawn({
		let engine = engine.clone();
		async move { engine.stop().await }
	});
	tokio::time::sleep(Duration::from_millis(20)).await;

	let restarting = Instant::now();
	engine.start().await.unwrap();
	assert!(restarting.elapsed() >= Duration::from_millis(200));

	// The old loop finished draining before the new one began.
	let report = engine.status().await.unwrap().last_cycle.unwrap();
	assert_eq!(report.abandoned, 1);
	stopping.await.unwrap().unwrap();

	assert!(engine.is_running().await);
	engine.stop().await.unwrap();
}
