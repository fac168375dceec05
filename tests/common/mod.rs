#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use seltrans::event::Effect;
use seltrans::scheduler::HostSurface;
use seltrans::translate::providers::ProviderRequest;
use seltrans::translate::transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};

/// Sends provider requests to a local mock server instead of the real host,
/// keeping path and query.
pub struct RebaseTransport {
    base: String,
    inner: ReqwestTransport,
}

impl RebaseTransport {
    pub fn new(base: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            base: base.into(),
            inner: ReqwestTransport::new(Duration::from_secs(5)).unwrap(),
        })
    }
}

impl HttpTransport for RebaseTransport {
    fn send(&self, mut request: ProviderRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        let after_scheme = request.url.split_once("://").map_or("", |(_, rest)| rest);
        let path = after_scheme.find('/').map_or("/", |i| &after_scheme[i..]);
        request.url = format!("{}{}", self.base, path);
        self.inner.send(request)
    }
}

#[derive(Default)]
pub struct RecordingHost {
    pub effects: Mutex<Vec<Effect>>,
}

impl HostSurface for RecordingHost {
    fn apply(&self, effect: Effect) {
        self.effects.lock().push(effect);
    }
}

impl RecordingHost {
    /// Poll until an effect matching `pick` shows up after `skip` earlier ones.
    pub async fn wait_for<T>(&self, skip: usize, pick: impl Fn(&Effect) -> Option<T>) -> T {
        for _ in 0..500 {
            if let Some(found) = self.effects.lock().iter().skip(skip).find_map(&pick) {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("effect never arrived: {:?}", self.effects.lock());
    }

    pub fn len(&self) -> usize {
        self.effects.lock().len()
    }
}
