//! Interface strings in English and Chinese.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::translate::TargetLanguage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceLanguage {
    En,
    #[default]
    Zh,
}

impl InterfaceLanguage {
    pub fn code(self) -> &'static str {
        match self {
            InterfaceLanguage::En => "en",
            InterfaceLanguage::Zh => "zh",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "en" => InterfaceLanguage::En,
            "zh" => InterfaceLanguage::Zh,
            other => {
                warn!(code = other, "unknown interface language, using zh");
                InterfaceLanguage::Zh
            }
        }
    }

    pub fn texts(self) -> &'static UiTexts {
        match self {
            InterfaceLanguage::En => &EN,
            InterfaceLanguage::Zh => &ZH,
        }
    }

    /// Name of a target language as shown in the loading line.
    pub fn language_name(self, language: TargetLanguage) -> &'static str {
        let t = self.texts();
        match language {
            TargetLanguage::Chinese => t.chinese,
            TargetLanguage::Japanese => t.japanese,
            TargetLanguage::BritishEnglish => t.british_english,
        }
    }
}

pub struct UiTexts {
    pub translating_to: &'static str,
    pub copy_button: &'static str,
    pub copied: &'static str,
    pub request_failed: &'static str,
    pub please_configure_api: &'static str,
    pub chinese: &'static str,
    pub japanese: &'static str,
    pub british_english: &'static str,
}

static EN: UiTexts = UiTexts {
    translating_to: "Translating to",
    copy_button: "Copy",
    copied: "Copied",
    request_failed: "Translation request failed:",
    please_configure_api: "Please configure an API key and select an AI model in settings first.",
    chinese: "Chinese",
    japanese: "Japanese",
    british_english: "English",
};

static ZH: UiTexts = UiTexts {
    translating_to: "正在翻译成",
    copy_button: "复制",
    copied: "已复制",
    request_failed: "翻译请求失败：",
    please_configure_api: "请先在设置中输入 API 密钥并选择 AI 模型。",
    chinese: "中文",
    japanese: "日语",
    british_english: "英语",
};
