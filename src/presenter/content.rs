//! Panel bodies: loading line, formatted translation, or error line.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::i18n::InterfaceLanguage;
use crate::translate::{ErrorKind, TargetLanguage, TranslateError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelBody {
    Loading {
        message: String,
    },
    Translation {
        /// Markup for the content area.
        html: String,
        /// Text placed on the clipboard by the copy button.
        plain: String,
        copy_label: String,
    },
    Error {
        message: String,
        copy_label: String,
    },
}

impl PanelBody {
    /// "Translating to Japanese..." in the interface language.
    pub fn loading(ui: InterfaceLanguage, target: TargetLanguage) -> Self {
        PanelBody::Loading {
            message: format!("{} {}...", ui.texts().translating_to, ui.language_name(target)),
        }
    }

    pub fn translation(text: &str, ui: InterfaceLanguage) -> Self {
        PanelBody::Translation {
            html: format_translation(text),
            plain: text.trim().to_owned(),
            copy_label: ui.texts().copy_button.to_owned(),
        }
    }

    pub fn error(err: &TranslateError, ui: InterfaceLanguage) -> Self {
        let texts = ui.texts();
        let message = match err.kind() {
            ErrorKind::ConfigurationMissing => texts.please_configure_api.to_owned(),
            ErrorKind::ProviderError | ErrorKind::NetworkError | ErrorKind::ParseError => {
                format!("{} {}", texts.request_failed, err)
            }
        };
        PanelBody::Error {
            message,
            copy_label: texts.copy_button.to_owned(),
        }
    }

    /// What the copy button puts on the clipboard. Error lines copy too.
    pub fn plain_text(&self) -> Option<&str> {
        match self {
            PanelBody::Translation { plain, .. } => Some(plain),
            PanelBody::Error { message, .. } => Some(message),
            PanelBody::Loading { .. } => None,
        }
    }
}

// Literal pattern, compiled once; `new` only fails on invalid syntax.
static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>|<h[1-6]").expect("markup pattern is valid"));

/// Pass provider markup through untouched; otherwise escape and split into
/// `<p>` paragraphs on blank lines with `<br>` for single newlines.
pub fn format_translation(text: &str) -> String {
    if MARKUP.is_match(text) {
        return text.to_owned();
    }
    text.split("\n\n")
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .map(|para| format!("<p>{}</p>", escape_html(para).replace('\n', "<br>")))
        .collect()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::MissingSetting;

    #[test]
    fn paragraphs_and_line_breaks() {
        let html = format_translation("第一行\n第二行\n\n\n  第二段  ");
        assert_eq!(html, "<p>第一行<br>第二行</p><p>第二段</p>");
    }

    #[test]
    fn existing_markup_passes_through() {
        let text = "<h2>标题</h2><p>正文</p>";
        assert_eq!(format_translation(text), text);
    }

    #[test]
    fn plain_text_is_escaped() {
        assert_eq!(format_translation("a < b & c"), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn loading_line_is_localized() {
        assert_eq!(
            PanelBody::loading(InterfaceLanguage::En, TargetLanguage::Japanese),
            PanelBody::Loading { message: "Translating to Japanese...".into() }
        );
        assert_eq!(
            PanelBody::loading(InterfaceLanguage::Zh, TargetLanguage::BritishEnglish),
            PanelBody::Loading { message: "正在翻译成 英语...".into() }
        );
    }

    #[test]
    fn error_lines() {
        let missing = TranslateError::ConfigurationMissing(MissingSetting::ApiKey);
        assert_eq!(
            PanelBody::error(&missing, InterfaceLanguage::En),
            PanelBody::Error {
                message: "Please configure an API key and select an AI model in settings first.".into(),
                copy_label: "Copy".into(),
            }
        );

        let provider = TranslateError::Provider { status: 401, message: "invalid key".into() };
        assert_eq!(
            PanelBody::error(&provider, InterfaceLanguage::En),
            PanelBody::Error {
                message: "Translation request failed: invalid key".into(),
                copy_label: "Copy".into(),
            }
        );
        assert_eq!(
            PanelBody::error(&provider, InterfaceLanguage::En).plain_text(),
            Some("Translation request failed: invalid key")
        );
    }

    #[test]
    fn copy_text_is_trimmed_source() {
        let body = PanelBody::translation("  こんにちは世界\n", InterfaceLanguage::Zh);
        assert_eq!(body.plain_text(), Some("こんにちは世界"));
        assert!(matches!(body, PanelBody::Translation { ref copy_label, .. } if copy_label == "复制"));
    }
}
