use std::panic;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core::engine::Sandbox;
use crate::http::routes::{AppState, router};
use crate::native::runner::ProcessRunner;

mod config;
mod constants;
mod core;
mod http;
mod native;

#[cfg(test)]
mod integration_test;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    set_panic_hook();

    let config = Config::parse();
    tracing::debug!("Config: {:?}", config);

    tokio::fs::create_dir_all(&config.temp_dir).await?;
    let sandbox = Sandbox::new(
        &config.temp_dir,
        Arc::new(ProcessRunner::python(&config.python)),
        config.sandbox_settings(),
    );
    let state = Arc::new(AppState {
        sandbox,
        links: config.link_settings(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(
        "Sandbox listening on {}, artifacts under {}",
        config.bind,
        config.temp_dir.display()
    );
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
