use serde::{Deserialize, Serialize};
use std::fmt;

/// The six official document languages, plus a catch-all.
///
/// Unrecognized language codes map to `Other` rather than failing, so a
/// package is never silently dropped over a bad code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    Arabic,
    Chinese,
    English,
    French,
    Russian,
    Spanish,
    Other,
}

impl Language {
    /// Map an upstream language code (single letter or full name) to a
    /// language. Matching is case-insensitive.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" | "ARABIC" => Language::Arabic,
            "C" | "CHINESE" => Language::Chinese,
            "E" | "ENGLISH" => Language::English,
            "F" | "FRENCH" => Language::French,
            "R" | "RUSSIAN" => Language::Russian,
            "S" | "SPANISH" => Language::Spanish,
            _ => Language::Other,
        }
    }

    /// Two-letter code used in package filenames.
    pub fn iso_code(&self) -> &'static str {
        match self {
            Language::Arabic => "AR",
            Language::Chinese => "ZH",
            Language::English => "EN",
            Language::French => "FR",
            Language::Russian => "RU",
            Language::Spanish => "ES",
            Language::Other => "OT",
        }
    }

    /// Fixed manifest precedence: English first, then French, Russian,
    /// Spanish, Arabic, Chinese, and anything else last.
    pub fn bundle_order(&self) -> u8 {
        match self {
            Language::English => 1,
            Language::French => 2,
            Language::Russian => 3,
            Language::Spanish => 4,
            Language::Arabic => 5,
            Language::Chinese => 6,
            Language::Other => 7,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Arabic => "Arabic",
            Language::Chinese => "Chinese",
            Language::English => "English",
            Language::French => "French",
            Language::Russian => "Russian",
            Language::Spanish => "Spanish",
            Language::Other => "Other",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_single_letter() {
        assert_eq!(Language::from_code("A"), Language::Arabic);
        assert_eq!(Language::from_code("C"), Language::Chinese);
        assert_eq!(Language::from_code("E"), Language::English);
        assert_eq!(Language::from_code("F"), Language::French);
        assert_eq!(Language::from_code("R"), Language::Russian);
        assert_eq!(Language::from_code("S"), Language::Spanish);
    }

    #[test]
    fn test_from_code_full_name() {
        assert_eq!(Language::from_code("english"), Language::English);
        assert_eq!(Language::from_code(" French "), Language::French);
    }

    #[test]
    fn test_from_code_unrecognized_is_other() {
        assert_eq!(Language::from_code("G"), Language::Other);
        assert_eq!(Language::from_code(""), Language::Other);
        assert_eq!(Language::from_code("Klingon"), Language::Other);
    }

    #[test]
    fn test_bundle_order_precedence() {
        let mut langs = vec![
            Language::Arabic,
            Language::English,
            Language::Chinese,
            Language::French,
        ];
        langs.sort_by_key(Language::bundle_order);
        assert_eq!(
            langs,
            vec![
                Language::English,
                Language::French,
                Language::Arabic,
                Language::Chinese
            ]
        );
    }
}
