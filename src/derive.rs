//! Title and body derivation from accumulated story text.
//!
//! The backend marks the story title with a bracketed span, e.g.
//! `[The Brave Little Dragon]`. The first span is the title; every span is
//! stripped from the body. Both functions are pure.

use std::sync::OnceLock;

use regex::Regex;

fn title_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"\[(.*?)\]").expect("title regex must compile"))
}

fn span_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"\[.*?\]").expect("span regex must compile"))
}

/// Inner text of the first `[...]` span, or an empty string.
pub fn derive_title(raw: &str) -> String {
    title_regex()
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str().to_string())
        .unwrap_or_default()
}

/// `raw` with every `[...]` span removed. Nothing else is touched.
pub fn derive_body(raw: &str) -> String {
    span_regex().replace_all(raw, "").into_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedView {
    pub title: String,
    pub body: String,
}

impl DerivedView {
    pub fn from_raw(raw: &str) -> Self {
        Self {
            title: derive_title(raw),
            body: derive_body(raw),
        }
    }
}
