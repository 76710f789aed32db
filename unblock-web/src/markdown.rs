//! Helpers for the raw markdown the unlocking API returns.
use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^\s\)]+(?:\([^\)]*\))?[^\s\)\]]*").expect("url pattern compiles")
});

/// Every HTTP(S) URL in `markdown`, in order of appearance, with trailing `)` removed.
///
/// ```
/// use unblock_web::markdown::extract_urls;
///
/// let md = "[Rust](https://www.rust-lang.org/) and (https://crates.io)";
/// assert_eq!(
///     extract_urls(md),
///     vec!["https://www.rust-lang.org/", "https://crates.io"]
/// );
/// ```
pub fn extract_urls(markdown: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(markdown)
        .map(|m| m.as_str().trim_end_matches(')').to_string())
        .collect()
}

/// The first `max_chars` characters of `text`.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
