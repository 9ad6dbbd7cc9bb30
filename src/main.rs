use dotenvy::dotenv;
use find_keeper::bot::{TelegramApi, TeloxideApi};
use find_keeper::config::{Settings, POLL_TIMEOUT_SECS, SHUTDOWN_GRACE_SECS};
use find_keeper::logging::{init_logging, RedactionPatterns};
use find_keeper::relay::Relay;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file before anything reads the environment
    let dotenv_loaded = dotenv().is_ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    init_logging(patterns);

    if !dotenv_loaded {
        info!("No .env file found, using system environment variables");
    }

    let settings = init_settings();
    let api = init_session(&settings).await;

    let relay = match Relay::new(api, &settings) {
        Ok(relay) => Arc::new(relay),
        Err(e) => {
            error!("Invalid relay configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Bot started for channel: {}", relay.channel().0);

    let mut worker = tokio::spawn({
        let relay = Arc::clone(&relay);
        async move { relay.start().await }
    });

    let joined = tokio::select! {
        () = shutdown_signal() => {
            relay.stop();
            match tokio::time::timeout(Duration::from_secs(SHUTDOWN_GRACE_SECS), &mut worker).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        "Relay did not finish within {}s, abandoning in-flight message",
                        SHUTDOWN_GRACE_SECS
                    );
                    worker.abort();
                    return Ok(());
                }
            }
        }
        joined = &mut worker => joined,
    };

    match joined {
        Ok(Ok(())) => {
            info!("Shutdown complete.");
            Ok(())
        }
        Ok(Err(e)) => {
            error!("Relay terminated: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Relay task failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn init_session(settings: &Settings) -> Arc<dyn TelegramApi> {
    let api = match TeloxideApi::new(settings, POLL_TIMEOUT_SECS) {
        Ok(api) => api,
        Err(e) => {
            error!("Failed to create bot session: {}", e);
            std::process::exit(1);
        }
    };

    match api.verify_session().await {
        Ok(username) => info!("Authorized on account @{}", username),
        Err(e) => {
            error!("Failed to authorize bot: {}", e);
            std::process::exit(1);
        }
    }

    Arc::new(api)
}

/// Resolves on Ctrl-C (SIGINT) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        () = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
