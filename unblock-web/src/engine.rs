//! Search engines reachable through the unlocking API and their result-page URLs.
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Deserializer, Serialize};

/// Everything except ASCII alphanumerics and `-_.~/` is escaped.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Google,
    Bing,
    Yandex,
}

impl SearchEngine {
    pub const ALL: [SearchEngine; 3] = [SearchEngine::Google, SearchEngine::Bing, SearchEngine::Yandex];

    /// Lenient lookup; anything unrecognised resolves to Google.
    ///
    /// ```
    /// use unblock_web::SearchEngine;
    ///
    /// assert_eq!(SearchEngine::from_name(" Bing "), SearchEngine::Bing);
    /// assert_eq!(SearchEngine::from_name("duckduckgo"), SearchEngine::Google);
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "bing" => SearchEngine::Bing,
            "yandex" => SearchEngine::Yandex,
            _ => SearchEngine::Google,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngine::Google => "google",
            SearchEngine::Bing => "bing",
            SearchEngine::Yandex => "yandex",
        }
    }

    /// Result-page URL for `query` on this engine.
    ///
    /// ```
    /// use unblock_web::SearchEngine;
    ///
    /// assert_eq!(
    ///     SearchEngine::Yandex.search_url("cute panda"),
    ///     "https://yandex.com/search/?text=cute%20panda"
    /// );
    /// ```
    pub fn search_url(&self, query: &str) -> String {
        let q = utf8_percent_encode(query, QUERY_ENCODE_SET);
        match self {
            SearchEngine::Google => format!("https://www.google.com/search?q={q}"),
            SearchEngine::Bing => format!("https://www.bing.com/search?q={q}"),
            SearchEngine::Yandex => format!("https://yandex.com/search/?text={q}"),
        }
    }
}

/// Goes through [`SearchEngine::from_name`], so unknown names become Google.
impl<'de> Deserialize<'de> for SearchEngine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(SearchEngine::from_name(&name))
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_engine_uses_its_template() {
        assert_eq!(
            SearchEngine::Google.search_url("rust lang"),
            "https://www.google.com/search?q=rust%20lang"
        );
        assert_eq!(
            SearchEngine::Bing.search_url("rust lang"),
            "https://www.bing.com/search?q=rust%20lang"
        );
        assert_eq!(
            SearchEngine::Yandex.search_url("rust lang"),
            "https://yandex.com/search/?text=rust%20lang"
        );
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(
            SearchEngine::Google.search_url("a&b=c?d#e+f"),
            "https://www.google.com/search?q=a%26b%3Dc%3Fd%23e%2Bf"
        );
    }

    #[test]
    fn unreserved_characters_and_slash_are_kept() {
        assert_eq!(
            SearchEngine::Google.search_url("a-b_c.d~e/f"),
            "https://www.google.com/search?q=a-b_c.d~e/f"
        );
    }

    #[test]
    fn non_ascii_is_utf8_encoded() {
        assert_eq!(
            SearchEngine::Bing.search_url("café"),
            "https://www.bing.com/search?q=caf%C3%A9"
        );
    }

    #[test]
    fn unknown_names_fall_back_to_google() {
        for name in ["", "duckduckgo", "GOOGLE", "baidu"] {
            assert_eq!(SearchEngine::from_name(name), SearchEngine::Google);
        }
        assert_eq!(
            SearchEngine::from_name("ask").search_url("x"),
            "https://www.google.com/search?q=x"
        );
    }

    #[test]
    fn deserializes_leniently() {
        let parse =
            |raw: &str| serde_json::from_value::<SearchEngine>(serde_json::json!(raw)).unwrap();
        assert_eq!(parse("Bing"), SearchEngine::Bing);
        assert_eq!(parse(" YANDEX "), SearchEngine::Yandex);
        assert_eq!(parse("duckduckgo"), SearchEngine::Google);
        assert!(serde_json::from_value::<SearchEngine>(serde_json::json!(3)).is_err());
    }

    #[test]
    fn names_round_trip() {
        for engine in SearchEngine::ALL {
            assert_eq!(SearchEngine::from_name(engine.as_str()), engine);
            assert_eq!(engine.to_string(), engine.as_str());
        }
    }
}
