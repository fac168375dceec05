//! Provider registry: one static entry per backend, each pointing at the
//! wire protocol that builds its request and parses its response.
//! Adding a provider means adding one entry here.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::prompt::Prompt;
use super::TranslateError;

/// Fully built HTTP request for one provider call.
#[derive(Clone, PartialEq)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl ProviderRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Keys travel in headers or the query string; keep them out of Debug output.
impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = match self.url.split_once("?key=") {
            Some((base, _)) => format!("{base}?key=****"),
            None => self.url.clone(),
        };
        let headers: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("ProviderRequest")
            .field("url", &url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Request/response shape shared by a family of providers.
pub trait WireProtocol: Send + Sync {
    fn name(&self) -> &'static str;

    fn build_request(
        &self,
        endpoint: &str,
        api_key: &str,
        model: &str,
        prompt: &Prompt,
    ) -> ProviderRequest;

    /// JSON pointer to the translated text in a success body.
    fn text_pointer(&self) -> &'static str;

    /// Message used when an error body carries no `error.message`.
    fn fallback_error(&self) -> &'static str;

    fn parse_response(&self, status: u16, body: &str) -> Result<String, TranslateError> {
        let parsed = serde_json::from_str::<Value>(body);

        if status != 200 {
            let message = parsed
                .as_ref()
                .ok()
                .and_then(|v| v.pointer("/error/message"))
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| self.fallback_error().to_owned());
            return Err(TranslateError::Provider { status, message });
        }

        let value = parsed.map_err(|e| {
            TranslateError::Parse(format!("{}: invalid JSON body: {e}", self.fallback_error()))
        })?;

        value
            .pointer(self.text_pointer())
            .and_then(Value::as_str)
            .map(|text| text.trim().to_owned())
            .ok_or_else(|| {
                TranslateError::Parse(format!(
                    "{}: response has no {}",
                    self.fallback_error(),
                    self.text_pointer()
                ))
            })
    }
}

/// `POST /chat/completions` with bearer auth and system/user roles.
pub struct ChatCompletions;

impl WireProtocol for ChatCompletions {
    fn name(&self) -> &'static str {
        "chat-completions"
    }

    fn build_request(&self, endpoint: &str, api_key: &str, model: &str, prompt: &Prompt) -> ProviderRequest {
        ProviderRequest {
            url: endpoint.to_owned(),
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("Authorization".into(), format!("Bearer {api_key}")),
            ],
            body: json!({
                "model": model,
                "messages": [
                    { "role": "system", "content": prompt.system },
                    { "role": "user", "content": prompt.user },
                ],
            }),
        }
    }

    fn text_pointer(&self) -> &'static str {
        "/choices/0/message/content"
    }

    fn fallback_error(&self) -> &'static str {
        "Chat Completions API error"
    }
}

/// `generateContent` with the key in the query string and a merged prompt.
pub struct GenerateContent;

impl WireProtocol for GenerateContent {
    fn name(&self) -> &'static str {
        "generate-content"
    }

    fn build_request(&self, endpoint: &str, api_key: &str, _model: &str, prompt: &Prompt) -> ProviderRequest {
        ProviderRequest {
            url: format!("{endpoint}?key={api_key}"),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: json!({
                "contents": [
                    { "parts": [ { "text": prompt.merged() } ] }
                ],
            }),
        }
    }

    fn text_pointer(&self) -> &'static str {
        "/candidates/0/content/parts/0/text"
    }

    fn fallback_error(&self) -> &'static str {
        "Google Gemini API error"
    }
}

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const MESSAGES_MAX_TOKENS: u32 = 1024;

/// Messages API: custom key header, top-level `system`, user-only messages.
pub struct Messages;

impl WireProtocol for Messages {
    fn name(&self) -> &'static str {
        "messages"
    }

    fn build_request(&self, endpoint: &str, api_key: &str, model: &str, prompt: &Prompt) -> ProviderRequest {
        ProviderRequest {
            url: endpoint.to_owned(),
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("x-api-key".into(), api_key.to_owned()),
                ("anthropic-version".into(), ANTHROPIC_VERSION.into()),
            ],
            body: json!({
                "model": model,
                "system": prompt.system,
                "messages": [ { "role": "user", "content": prompt.user } ],
                "max_tokens": MESSAGES_MAX_TOKENS,
            }),
        }
    }

    fn text_pointer(&self) -> &'static str {
        "/content/0/text"
    }

    fn fallback_error(&self) -> &'static str {
        "Anthropic API error"
    }
}

/// Supported backends. Serialized as the stored `selectedAI` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Gemini,
    Anthropic,
    Grok,
    DeepSeek,
    Qwen,
    Doubao,
}

impl ProviderId {
    pub fn entry(self) -> &'static ProviderEntry {
        match self {
            ProviderId::OpenAi => &OPENAI,
            ProviderId::Gemini => &GEMINI,
            ProviderId::Anthropic => &ANTHROPIC,
            ProviderId::Grok => &GROK,
            ProviderId::DeepSeek => &DEEPSEEK,
            ProviderId::Qwen => &QWEN,
            ProviderId::Doubao => &DOUBAO,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.entry().key
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        REGISTRY.iter().find(|e| e.key == key).map(|e| e.id)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ProviderEntry {
    pub id: ProviderId,
    /// Stored identifier, e.g. `deepseek`.
    pub key: &'static str,
    pub label: &'static str,
    /// May contain a `{model}` placeholder.
    pub endpoint: &'static str,
    pub default_model: &'static str,
    pub protocol: &'static dyn WireProtocol,
}

impl ProviderEntry {
    /// User-configured model, or this provider's default when blank.
    pub fn effective_model<'a>(&'a self, configured: &'a str) -> &'a str {
        let configured = configured.trim();
        if configured.is_empty() {
            self.default_model
        } else {
            configured
        }
    }

    pub fn endpoint_for(&self, model: &str) -> String {
        self.endpoint.replace("{model}", model)
    }

    pub fn parse_response(&self, status: u16, body: &str) -> Result<String, TranslateError> {
        self.protocol.parse_response(status, body)
    }
}

static OPENAI: ProviderEntry = ProviderEntry {
    id: ProviderId::OpenAi,
    key: "openai",
    label: "ChatGPT",
    endpoint: "https://api.openai.com/v1/chat/completions",
    default_model: "gpt-3.5-turbo",
    protocol: &ChatCompletions,
};

static GEMINI: ProviderEntry = ProviderEntry {
    id: ProviderId::Gemini,
    key: "gemini",
    label: "Gemini",
    endpoint: "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent",
    default_model: "gemini-2.0-flash",
    protocol: &GenerateContent,
};

static ANTHROPIC: ProviderEntry = ProviderEntry {
    id: ProviderId::Anthropic,
    key: "anthropic",
    label: "Claude",
    endpoint: "https://api.anthropic.com/v1/messages",
    default_model: "claude-3-haiku-20240307",
    protocol: &Messages,
};

static GROK: ProviderEntry = ProviderEntry {
    id: ProviderId::Grok,
    key: "grok",
    label: "Grok",
    endpoint: "https://api.x.ai/v1/chat/completions",
    default_model: "grok-2-latest",
    protocol: &ChatCompletions,
};

static DEEPSEEK: ProviderEntry = ProviderEntry {
    id: ProviderId::DeepSeek,
    key: "deepseek",
    label: "DeepSeek",
    endpoint: "https://api.deepseek.com/chat/completions",
    default_model: "deepseek-chat",
    protocol: &ChatCompletions,
};

static QWEN: ProviderEntry = ProviderEntry {
    id: ProviderId::Qwen,
    key: "qwen",
    label: "Qwen",
    endpoint: "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions",
    default_model: "qwen-plus",
    protocol: &ChatCompletions,
};

static DOUBAO: ProviderEntry = ProviderEntry {
    id: ProviderId::Doubao,
    key: "doubao",
    label: "Doubao",
    endpoint: "https://ark.cn-beijing.volces.com/api/v3/chat/completions",
    default_model: "doubao-lite",
    protocol: &ChatCompletions,
};

pub static REGISTRY: [&ProviderEntry; 7] =
    [&OPENAI, &GEMINI, &ANTHROPIC, &GROK, &DEEPSEEK, &QWEN, &DOUBAO];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{ErrorKind, TargetLanguage, TranslationRequest};

    fn prompt() -> Prompt {
        Prompt::for_request(&TranslationRequest {
            source_text: "Hello world".into(),
            target_language: TargetLanguage::Chinese,
            preserve_format: true,
        })
    }

    fn build(entry: &ProviderEntry, api_key: &str, model: &str) -> ProviderRequest {
        entry
            .protocol
            .build_request(&entry.endpoint_for(model), api_key, model, &prompt())
    }

    /// Success body with `text` placed at the entry's response path.
    fn success_body(entry: &ProviderEntry, text: &str) -> String {
        let value = match entry.protocol.name() {
            "chat-completions" => json!({ "choices": [ { "message": { "role": "assistant", "content": text } } ] }),
            "generate-content" => json!({ "candidates": [ { "content": { "parts": [ { "text": text } ] } } ] }),
            "messages" => json!({ "content": [ { "type": "text", "text": text } ] }),
            other => panic!("unexpected protocol {other}"),
        };
        value.to_string()
    }

    #[test]
    fn registry_keys_round_trip() {
        for entry in REGISTRY {
            assert_eq!(ProviderId::from_key(entry.key), Some(entry.id));
            assert!(std::ptr::eq(entry.id.entry(), entry));
            let serialized = serde_json::to_value(entry.id).unwrap();
            assert_eq!(serialized, json!(entry.key));
        }
        assert_eq!(ProviderId::from_key("bard"), None);
    }

    #[test]
    fn every_entry_parses_its_own_success_shape() {
        for entry in REGISTRY {
            let model = entry.effective_model("");
            let request = build(entry, "sk-test", model);
            assert!(request.url.starts_with("https://"), "{}", entry.key);

            let parsed = entry
                .parse_response(200, &success_body(entry, "  你好，世界\n"))
                .unwrap();
            assert_eq!(parsed, "你好，世界", "{}", entry.key);
        }
    }

    #[test]
    fn chat_completions_shape() {
        let entry = ProviderId::DeepSeek.entry();
        let req = build(entry, "sk-1", "deepseek-chat");
        assert_eq!(req.url, "https://api.deepseek.com/chat/completions");
        assert_eq!(req.header("authorization"), Some("Bearer sk-1"));
        assert_eq!(req.body["model"], "deepseek-chat");
        assert_eq!(req.body["messages"][0]["role"], "system");
        assert_eq!(req.body["messages"][1]["role"], "user");
        assert!(req.body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .ends_with("Hello world"));
    }

    #[test]
    fn generate_content_templates_model_and_key() {
        let entry = ProviderId::Gemini.entry();
        let req = build(entry, "g-key", "gemini-1.5-pro");
        assert_eq!(
            req.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent?key=g-key"
        );
        assert_eq!(req.header("authorization"), None);
        let text = req.body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert_eq!(text, prompt().merged());
        assert!(!format!("{req:?}").contains("g-key"));
    }

    #[test]
    fn messages_shape() {
        let entry = ProviderId::Anthropic.entry();
        let req = build(entry, "ak", "claude-3-haiku-20240307");
        assert_eq!(req.header("x-api-key"), Some("ak"));
        assert_eq!(req.header("anthropic-version"), Some(ANTHROPIC_VERSION));
        assert_eq!(req.body["max_tokens"], 1024);
        assert_eq!(req.body["system"], prompt().system);
        assert_eq!(req.body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(req.body["messages"][0]["role"], "user");
    }

    #[test]
    fn error_status_prefers_provider_message() {
        let entry = ProviderId::OpenAi.entry();
        let err = entry
            .parse_response(429, r#"{"error":{"message":"quota exceeded"}}"#)
            .unwrap_err();
        assert_eq!(
            err,
            TranslateError::Provider { status: 429, message: "quota exceeded".into() }
        );

        let err = entry.parse_response(502, "<html>bad gateway</html>").unwrap_err();
        assert_eq!(err.to_string(), "Chat Completions API error");
        assert_eq!(err.kind(), ErrorKind::ProviderError);
    }

    #[test]
    fn malformed_success_is_parse_error() {
        let entry = ProviderId::Anthropic.entry();
        let err = entry.parse_response(200, "not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);

        let err = entry.parse_response(200, r#"{"content":[]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert!(err.to_string().starts_with("Anthropic API error"));
    }

    #[test]
    fn configured_model_wins_over_default() {
        let entry = ProviderId::Qwen.entry();
        assert_eq!(entry.effective_model("  "), "qwen-plus");
        assert_eq!(entry.effective_model("qwen-max"), "qwen-max");
    }
}
