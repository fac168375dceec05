//! Translation client: reads provider settings, builds the prompt, sends one
//! request through the configured registry entry and classifies the outcome.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::prompt::Prompt;
use super::transport::HttpTransport;
use super::{Translation, TranslateError, TranslationRequest, TranslationResult};
use crate::config::{mask_key, ConfigStore, ProviderConfig};

/// One request at a time; callers guarantee no overlap.
pub struct TranslationClient {
    store: Arc<dyn ConfigStore>,
    transport: Arc<dyn HttpTransport>,
}

impl TranslationClient {
    pub fn new(store: Arc<dyn ConfigStore>, transport: Arc<dyn HttpTransport>) -> Self {
        Self { store, transport }
    }

    pub async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        // Settings are re-read per request so a saved dialog applies at once.
        let config = ProviderConfig::load(self.store.as_ref()).map_err(|e| {
            warn!(error = %e, "translation not configured");
            e
        })?;

        let request_id = uuid::Uuid::new_v4().to_string();
        let entry = config.provider.entry();
        let prompt = Prompt::for_request(request);
        let http_request =
            entry
                .protocol
                .build_request(&config.endpoint, &config.api_key, &config.model, &prompt);

        info!(
            request_id = %request_id,
            provider = %config.provider,
            label = entry.label,
            protocol = entry.protocol.name(),
            model = %config.model,
            key = %mask_key(&config.api_key),
            target = %request.target_language,
            chars = request.source_text.chars().count(),
            "translate_start"
        );
        debug!(request_id = %request_id, request = ?http_request, "provider_request");

        let start = Instant::now();
        let response = self.transport.send(http_request).await.map_err(|e| {
            warn!(request_id = %request_id, error = %e, timed_out = e.timed_out, "transport_failed");
            TranslateError::Network(e.message)
        })?;

        let text = entry.parse_response(response.status, &response.body).map_err(|e| {
            warn!(
                request_id = %request_id,
                status = response.status,
                kind = ?e.kind(),
                error = %e,
                "translate_failed"
            );
            e
        })?;

        info!(
            request_id = %request_id,
            status = response.status,
            latency_ms = start.elapsed().as_millis() as u64,
            out_chars = text.chars().count(),
            "translate_done"
        );
        Ok(Translation {
            text,
            provider: config.provider,
            model: config.model,
        })
    }
}
