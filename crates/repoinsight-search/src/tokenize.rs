//! Query and document tokenization
//!
//! The same pipeline runs at index time and query time: lowercase,
//! extract file-name tokens and general word/CJK tokens, add the base
//! name of every file-name token, deduplicate, and drop single-char
//! tokens. At index time callers feed chunk text concatenated with its
//! file path so path components are searchable.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    /// Complete file names such as `query_service.py`
    static ref FILE_NAME_TOKEN: Regex = Regex::new(r"[A-Za-z0-9_-]+\.[A-Za-z0-9]+").unwrap();
    /// Words (identifier-ish) or CJK runs
    static ref GENERAL_TOKEN: Regex = Regex::new(r"[A-Za-z0-9_-]+|[一-鿿]+").unwrap();
    /// Shape check for treating a query token as a file-name pattern
    pub static ref FILE_NAME_SHAPE: Regex = Regex::new(r"^[A-Za-z0-9_-]+\.[A-Za-z0-9]+$").unwrap();
}

/// Tokenize text into a deduplicated, sorted token list.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tokens = BTreeSet::new();

    for m in GENERAL_TOKEN.find_iter(&lowered) {
        tokens.insert(m.as_str().to_string());
    }

    for m in FILE_NAME_TOKEN.find_iter(&lowered) {
        let file_token = m.as_str();
        tokens.insert(file_token.to_string());
        if let Some(base) = file_token.split('.').next() {
            tokens.insert(base.to_string());
        }
    }

    tokens.into_iter().filter(|t| t.chars().count() > 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_components_and_file_names_are_tokens() {
        let tokens = tokenize("src/services/query_service.py");
        for expected in ["query_service.py", "query_service", "src", "services"] {
            assert!(tokens.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[test]
    fn tokens_are_lowercased_and_deduplicated() {
        let tokens = tokenize("Router ROUTER router");
        assert_eq!(tokens, vec!["router"]);
    }

    #[test]
    fn single_character_tokens_are_dropped() {
        let tokens = tokenize("a b cd");
        assert_eq!(tokens, vec!["cd"]);
    }

    #[test]
    fn cjk_runs_are_kept() {
        let tokens = tokenize("路由 定义在哪里 routing");
        assert!(tokens.iter().any(|t| t == "路由"));
        assert!(tokens.iter().any(|t| t == "routing"));
    }
}
