//! Prompt construction shared by every provider.
//! Providers with role separation send `system` and `user` apart; the rest
//! merge them into one prompt.

use super::{TargetLanguage, TranslationRequest};

const BASE_INSTRUCTION: &str = "You are a precise translation assistant.";

const PRESERVE_FORMAT_INSTRUCTION: &str = "Please maintain the original format structure \
(headings, paragraphs, etc.), ensuring the translated text matches the original format exactly.";

/// Rendered prompt pair for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn for_request(request: &TranslationRequest) -> Self {
        Self {
            system: system_prompt(request.target_language, request.preserve_format),
            user: user_prompt(&request.source_text, request.target_language),
        }
    }

    /// Single-prompt form for providers without a system role.
    pub fn merged(&self) -> String {
        format!("{}\n{}", self.system, self.user)
    }
}

fn language_instruction(language: TargetLanguage) -> &'static str {
    match language {
        TargetLanguage::Chinese => {
            "Please translate the text into fluent, natural Chinese, using modern Mandarin \
             expressions and avoiding literal translations."
        }
        TargetLanguage::Japanese => {
            "Please translate the text into standard Japanese, using appropriate honorifics \
             and grammatical structures, ensuring it conforms to Japanese expression habits."
        }
        TargetLanguage::BritishEnglish => {
            "Please translate the text into British English, using British spelling \
             conventions (such as 'colour' rather than 'color'), and British expressions."
        }
    }
}

pub fn system_prompt(language: TargetLanguage, preserve_format: bool) -> String {
    let mut prompt = String::with_capacity(320);
    prompt.push_str(BASE_INSTRUCTION);
    prompt.push(' ');
    prompt.push_str(language_instruction(language));
    if preserve_format {
        prompt.push(' ');
        prompt.push_str(PRESERVE_FORMAT_INSTRUCTION);
    }
    prompt
}

pub fn user_prompt(text: &str, language: TargetLanguage) -> String {
    format!(
        "Please translate the following text to {}:\n\n{}",
        language.prompt_name(),
        text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_orders_base_language_then_format() {
        let p = system_prompt(TargetLanguage::Japanese, true);
        let base = p.find(BASE_INSTRUCTION).unwrap();
        let lang = p.find("standard Japanese").unwrap();
        let fmt = p.find("original format structure").unwrap();
        assert!(base < lang && lang < fmt);
    }

    #[test]
    fn format_instruction_only_when_requested() {
        let p = system_prompt(TargetLanguage::BritishEnglish, false);
        assert!(p.contains("'colour' rather than 'color'"));
        assert!(!p.contains("original format structure"));
    }

    #[test]
    fn unknown_code_uses_chinese_guidance() {
        let lang = TargetLanguage::from_code("klingon");
        assert_eq!(lang, TargetLanguage::Chinese);
        assert!(system_prompt(lang, false).contains("modern Mandarin"));
        assert!(user_prompt("hi", lang).starts_with("Please translate the following text to Chinese:"));
    }

    #[test]
    fn merged_prompt_joins_with_newline() {
        let prompt = Prompt::for_request(&TranslationRequest {
            source_text: "Good morning".into(),
            target_language: TargetLanguage::Chinese,
            preserve_format: false,
        });
        let merged = prompt.merged();
        assert_eq!(merged, format!("{}\n{}", prompt.system, prompt.user));
        assert!(merged.ends_with("\n\nGood morning"));
    }
}
