//! Seltrans: selection-triggered translation core.
//! Tracks text selections, shows a translate affordance, sends the selection
//! to the configured LLM provider and places the result panel beside it.
//! The host document talks to it over JSON lines on stdin/stdout.

pub mod bridge;
pub mod cancellation;
pub mod config;
pub mod event;
pub mod geometry;
pub mod i18n;
pub mod metrics;
pub mod presenter;
pub mod reactor;
pub mod scheduler;
pub mod state_machine;
pub mod tracker;
pub mod translate;

use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{ConfigError, ConfigStore, JsonFileStore};
use metrics::MetricsRegistry;
use scheduler::Driver;
use translate::transport::{ReqwestTransport, TransportError, DEFAULT_TIMEOUT};
use translate::TranslationClient;

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "SELTRANS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "seltrans.json";

const HOST_EVENT_QUEUE: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("transport init failed: {0}")]
    Transport(#[from] TransportError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the bridge until the host closes stdin.
pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("seltrans=debug")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let config_path =
        PathBuf::from(std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned()));
    info!(config = %config_path.display(), "seltrans starting");

    let store: Arc<dyn ConfigStore> = Arc::new(JsonFileStore::open(config_path)?);
    let transport = Arc::new(ReqwestTransport::new(DEFAULT_TIMEOUT)?);
    let client = Arc::new(TranslationClient::new(Arc::clone(&store), transport));
    let metrics = Arc::new(MetricsRegistry::new());

    let (host, writer) = bridge::spawn_writer(std::io::stdout())?;
    let (event_tx, event_rx) = mpsc::channel(HOST_EVENT_QUEUE);
    // Not joined: it may sit in a blocking read after the driver stops.
    bridge::spawn_reader(BufReader::new(std::io::stdin()), event_tx)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let driver = Driver::new(store, client, Arc::new(host), metrics);
    let shutdown = driver.shutdown_token();
    runtime.block_on(async move {
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received");
                shutdown.cancel();
            }
        });
        driver.run(event_rx).await;
        interrupt.abort();
    });
    drop(runtime);

    if writer.join().is_err() {
        warn!("effect writer panicked");
    }
    info!("seltrans stopped");
    Ok(())
}
