//! Word segmentation for the `wakati` output columns

use regex::Regex;
use std::sync::OnceLock;

use crate::{Error, Result};

/// Splits text into space-separated tokens
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> String;
}

static SCRIPT_RUN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();

fn script_run() -> Result<&'static Regex> {
    SCRIPT_RUN
        .get_or_init(|| {
            Regex::new(r"[\p{sc=Han}々〆]+|\p{sc=Hiragana}+|[\p{sc=Katakana}ー]+|[\p{sc=Latin}\p{N}_]+|\S")
        })
        .as_ref()
        .map_err(|e| Error::Internal {
            message: "script run pattern failed to compile".to_string(),
            source: anyhow::anyhow!(e.to_string()),
        })
}

/// Dictionary-free tokenizer that cuts wherever the script changes.
///
/// Kanji, hiragana, katakana and latin/digit runs each form one token;
/// every other visible character is a token of its own.
#[derive(Debug, Clone, Copy)]
pub struct ScriptTokenizer {
    pattern: &'static Regex,
}

impl ScriptTokenizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: script_run()?,
        })
    }
}

impl Tokenizer for ScriptTokenizer {
    fn tokenize(&self, text: &str) -> String {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_japanese_runs() {
        let tokenizer = ScriptTokenizer::new().unwrap();
        assert_eq!(
            tokenizer.tokenize("ずいぶん前に作ったロゴ。"),
            "ずいぶん 前 に 作 った ロゴ 。"
        );
    }

    #[test]
    fn test_mixed_text_and_symbols() {
        let tokenizer = ScriptTokenizer::new().unwrap();
        assert_eq!(tokenizer.tokenize("#ロゴ #logo2020"), "# ロゴ # logo2020");
        assert_eq!(tokenizer.tokenize("  コーヒー\n\n好き "), "コーヒー 好 き");
    }

    #[test]
    fn test_empty_text() {
        let tokenizer = ScriptTokenizer::new().unwrap();
        assert_eq!(tokenizer.tokenize(""), "");
    }
}
