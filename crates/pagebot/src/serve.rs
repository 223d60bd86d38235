// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pagebot serve`: wire storage, providers, channels, and the engine
//! behind the HTTP gateway.

use std::sync::Arc;

use pagebot_ai::Providers;
use pagebot_anthropic::AnthropicProvider;
use pagebot_config::PagebotConfig;
use pagebot_core::{PagebotError, StorageAdapter};
use pagebot_engine::Engine;
use pagebot_gateway::{GatewayState, WebchatChannel, start_server};
use pagebot_gemini::GeminiProvider;
use pagebot_messenger::MessengerChannel;
use pagebot_openai::OpenAiProvider;
use pagebot_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub async fn run_serve(config: PagebotConfig) -> Result<(), PagebotError> {
    info!("starting pagebot serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = config.storage.database_path.as_str(), "storage ready");

    let providers = Providers {
        openai: Arc::new(OpenAiProvider::new(&config.providers.openai)?),
        anthropic: Arc::new(AnthropicProvider::new(&config.providers.anthropic)?),
        gemini: Arc::new(GeminiProvider::new(&config.providers.gemini)?),
    };

    if config.messenger.app_secret.is_none() {
        warn!("messenger.app_secret is not set; webhook signatures will not be checked");
    }
    let messenger = Arc::new(MessengerChannel::new(&config.messenger)?);

    let engine = Engine::new(&config, storage.clone(), providers)
        .with_channel(messenger)
        .with_channel(Arc::new(WebchatChannel::new()));
    let state = GatewayState::new(Arc::new(engine), config.messenger.clone());

    let cancel = install_signal_handler();
    start_server(&config.server, state, cancel.cancelled_owned()).await?;

    storage.close().await?;
    info!("pagebot stopped");
    Ok(())
}

/// A token cancelled on SIGINT or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("received Ctrl+C, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pagebot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
