// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shipwatch server binary.

use clap::{Parser, Subcommand};
use shipwatch_server::{build_engine, create_router, version, AppState};
use shipwatch_server_config::{LogFormat, ServerConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
	name = "shipwatch-server",
	about = "Shipment status monitoring server",
	version
)]
struct Args {
	/// Config file (defaults to /etc/shipwatch/server.toml)
	#[arg(long, short, env = "SHIPWATCH_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => shipwatch_server_config::load_config_with_file(path)?,
		None => shipwatch_server_config::load_config()?,
	};

	init_tracing(&config);

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		carriers = config.carriers.len(),
		"starting shipwatch-server"
	);

	let pool = shipwatch_server_db::create_pool(&config.database.url).await?;
	shipwatch_server_db::run_migrations(&pool).await?;

	let engine = build_engine(&config, pool.clone())?;
	if config.monitor.autostart {
		engine.start().await?;
	}

	let state = AppState::new(engine.clone(), pool, config.webhook.secret.clone());
	let app = create_router(state);

	let addr = config.socket_addr();
	let listener = tokio::net::TcpListener::bind(&addr).await?;
	tracing::info!("listening on {}", addr);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	if engine.is_running().await {
		tracing::info!("stopping monitoring loop");
		engine.stop().await?;
	}

	tracing::info!("server shutdown complete");
	Ok(())
}

fn init_tracing(config: &ServerConfig) {
	let json = config.logging.format == LogFormat::Json;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(json.then(|| tracing_subscriber::fmt::layer().json()))
		.with((!json).then(|| tracing_subscriber::fmt::layer()))
		.init();
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for ctrl-c");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => tracing::info!("received ctrl-c"),
		_ = terminate => tracing::info!("received SIGTERM"),
	}
}
