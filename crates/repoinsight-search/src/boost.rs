//! File-name boost applied to raw BM25 scores
//!
//! Queries that mention a file by name (`query_service.py`) should pull
//! that file's chunks up even when its text barely matches: +10 for an
//! exact basename match (with or without extension), +5 for a substring
//! match in the basename, +2 for a substring match anywhere in the
//! path.

use crate::tokenize::FILE_NAME_SHAPE;

const EXACT_BASENAME_BONUS: f64 = 10.0;
const BASENAME_SUBSTRING_BONUS: f64 = 5.0;
const PATH_SUBSTRING_BONUS: f64 = 2.0;

/// Extract file-name patterns from query tokens: every `name.ext`
/// token contributes itself and its base name.
pub fn file_name_patterns(query_tokens: &[String]) -> Vec<String> {
    let mut patterns = Vec::new();
    for token in query_tokens {
        if FILE_NAME_SHAPE.is_match(token) {
            patterns.push(token.clone());
            if let Some(base) = token.split('.').next() {
                patterns.push(base.to_string());
            }
        }
    }
    patterns
}

/// Bonus for one document's file path against the patterns.
pub fn file_name_bonus(patterns: &[String], file_path: &str) -> f64 {
    if patterns.is_empty() || file_path.is_empty() {
        return 0.0;
    }

    let path = file_path.to_lowercase();
    let basename = path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path.as_str())
        .to_string();
    let stem = basename.split('.').next().unwrap_or(&basename).to_string();

    let mut bonus = 0.0;
    for pattern in patterns {
        let pattern = pattern.to_lowercase();
        if basename.contains(&pattern) {
            if pattern == basename || pattern == stem {
                bonus += EXACT_BASENAME_BONUS;
            } else {
                bonus += BASENAME_SUBSTRING_BONUS;
            }
        }
        if path.contains(&pattern) {
            bonus += PATH_SUBSTRING_BONUS;
        }
    }
    bonus
}
