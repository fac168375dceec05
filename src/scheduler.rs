//! Effect driver: owns the reactor and applies what it returns.
//!
//! Two queues feed one task: host events from the bridge, and internal
//! completions (timers, translations). Timers and network work are
//! scheduled here; everything visual goes out through [`HostSurface`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancellation::TimerSet;
use crate::config::{ConfigStore, Settings};
use crate::event::{Effect, Event, HostEvent};
use crate::metrics::{metric_names, MetricsRegistry};
use crate::reactor::Reactor;
use crate::translate::{TranslationClient, TranslationRequest};

/// Where host-facing effects are delivered.
pub trait HostSurface: Send + Sync {
    fn apply(&self, effect: Effect);
}

pub struct Driver {
    reactor: Reactor,
    timers: TimerSet,
    client: Arc<TranslationClient>,
    host: Arc<dyn HostSurface>,
    store: Arc<dyn ConfigStore>,
    metrics: Arc<MetricsRegistry>,
    shutdown: CancellationToken,
    internal_tx: mpsc::UnboundedSender<Event>,
    internal_rx: mpsc::UnboundedReceiver<Event>,
}

impl Driver {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        client: Arc<TranslationClient>,
        host: Arc<dyn HostSurface>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let settings = Settings::load(store.as_ref());
        let shutdown = CancellationToken::new();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        Self {
            reactor: Reactor::new(&settings),
            timers: TimerSet::new(shutdown.child_token(), internal_tx.clone()),
            client,
            host,
            store,
            metrics,
            shutdown,
            internal_tx,
            internal_rx,
        }
    }

    /// Cancelling this token stops the driver loop.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run until the host channel closes or shutdown is requested.
    pub async fn run(mut self, mut host_rx: mpsc::Receiver<HostEvent>) {
        info!("driver started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
                Some(event) = self.internal_rx.recv() => self.dispatch(event),
                event = host_rx.recv() => match event {
                    Some(HostEvent::SettingsChanged) => self.reload_settings(),
                    Some(event) => self.dispatch(event.into()),
                    None => {
                        info!("host channel closed");
                        break;
                    }
                },
            }
        }

        self.timers.shutdown();
        self.shutdown.cancel();
        self.metrics.log_summary();
        info!("driver stopped");
    }

    /// Feed one event through the reactor and apply its effects.
    pub fn dispatch(&mut self, event: Event) {
        if let Event::Timer(timer) = &event {
            if !self.timers.fired(*timer) {
                debug!(?timer, "dropping cancelled timer");
                return;
            }
        }

        let span = self.metrics.span(metric_names::EVENT_HANDLED);
        let effects = self.reactor.handle(event);
        span.finish();

        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StartTimer { timer, delay } => self.timers.start(timer, delay),
            Effect::CancelTimer { timer } => {
                self.timers.cancel(timer);
            }
            Effect::Translate { generation, request } => self.spawn_translation(generation, request),
            visual => self.host.apply(visual),
        }
    }

    fn spawn_translation(&self, generation: u64, request: TranslationRequest) {
        let client = Arc::clone(&self.client);
        let tx = self.internal_tx.clone();
        let token = self.timers.child_token();
        let span = self.metrics.span(metric_names::TRANSLATE_DONE);

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "translation abandoned at shutdown");
                }
                result = client.translate(&request) => {
                    span.finish();
                    if tx.send(Event::Translated { generation, result }).is_err() {
                        debug!(generation, "driver gone before translation finished");
                    }
                }
            }
        });
    }

    fn reload_settings(&mut self) {
        if let Err(e) = self.store.reload() {
            warn!(error = %e, "settings reload failed, keeping current values");
            return;
        }
        let settings = Settings::load(self.store.as_ref());
        self.reactor.apply_settings(&settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{keys, MemoryStore};
    use crate::event::Surface;
    use crate::translate::providers::ProviderRequest;
    use crate::translate::transport::{HttpResponse, HttpTransport, TransportError};
    use futures_util::future::BoxFuture;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingHost {
        effects: Mutex<Vec<Effect>>,
    }

    impl HostSurface for RecordingHost {
        fn apply(&self, effect: Effect) {
            self.effects.lock().push(effect);
        }
    }

    struct Canned;

    impl HttpTransport for Canned {
        fn send(&self, _request: ProviderRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(HttpResponse {
                    status: 200,
                    body: json!({ "choices": [{ "message": { "content": "你好" } }] }).to_string(),
                })
            })
        }
    }

    fn driver(host: Arc<RecordingHost>) -> Driver {
        let store: Arc<dyn ConfigStore> = Arc::new(MemoryStore::with([
            (keys::API_KEY, json!("sk-test")),
            (keys::SELECTED_AI, json!("deepseek")),
            (keys::DELAY_SECONDS, json!(0.5)),
        ]));
        let client = Arc::new(TranslationClient::new(Arc::clone(&store), Arc::new(Canned)));
        Driver::new(store, client, host, Arc::new(MetricsRegistry::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn selection_flows_to_rendered_translation() {
        let host = Arc::new(RecordingHost::default());
        let driver = driver(Arc::clone(&host));
        let (tx, rx) = mpsc::channel(16);
        let run = tokio::spawn(driver.run(rx));

        tx.send(HostEvent::PointerUp {
            target: Surface::Page,
            selection: "Hello".into(),
            x: Some(50.0),
            y: Some(60.0),
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(host
            .effects
            .lock()
            .contains(&Effect::ShowAffordance { at: crate::geometry::Point::new(60.0, 70.0) }));

        tx.send(HostEvent::AffordanceActivated).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        drop(tx);
        run.await.unwrap();

        let effects = host.effects.lock();
        let bodies: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::RenderPanel { body, .. } => Some(body.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[1].plain_text(), Some("你好"));
        assert!(effects.contains(&Effect::HideAffordance));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_token_stops_driver_with_host_open() {
        let host = Arc::new(RecordingHost::default());
        let driver = driver(Arc::clone(&host));
        let shutdown = driver.shutdown_token();
        let (tx, rx) = mpsc::channel(16);
        let run = tokio::spawn(driver.run(rx));

        shutdown.cancel();
        run.await.unwrap();
        assert!(tx.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn pointer_down_within_delay_shows_nothing() {
        let host = Arc::new(RecordingHost::default());
        let driver = driver(Arc::clone(&host));
        let (tx, rx) = mpsc::channel(16);
        let run = tokio::spawn(driver.run(rx));

        tx.send(HostEvent::PointerUp {
            target: Surface::Page,
            selection: "Hello".into(),
            x: Some(50.0),
            y: Some(60.0),
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        tx.send(HostEvent::PointerDown { target: Surface::Page }).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        drop(tx);
        run.await.unwrap();

        assert!(!host
            .effects
            .lock()
            .iter()
            .any(|e| matches!(e, Effect::ShowAffordance { .. })));
    }
}
