//! Text processing utilities for tokenization and stop words

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PromiseError, Result};

/// Tokens are runs of two or more word characters
static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn get_token_pattern() -> &'static Regex {
    TOKEN_PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// Lowercase the text and split it into word tokens of length >= 2
///
/// Single-character tokens and punctuation are dropped. Lemmatized documents
/// arrive space-joined, so this mostly just drops punctuation lemmas.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    get_token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Tokenize and drop every token contained in `stop_words`
pub fn tokenize_filtered(text: &str, stop_words: Option<&HashSet<String>>) -> Vec<String> {
    let tokens = tokenize(text);
    match stop_words {
        Some(stop_words) => tokens
            .into_iter()
            .filter(|t| !stop_words.contains(t))
            .collect(),
        None => tokens,
    }
}

/// Parse a line-oriented stop-word list.
///
/// The first whitespace-delimited token of each line is the stop word; the
/// rest of the line (frequency columns) is ignored.
pub fn parse_stop_words(content: &str) -> HashSet<String> {
    content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(|word| word.to_lowercase())
        .collect()
}

/// Read a stop-word list from disk
pub fn read_stop_words(path: &Path) -> Result<HashSet<String>> {
    let content = fs::read_to_string(path)
        .map_err(|e| PromiseError::io_operation("read stop words from", path.display(), e))?;
    Ok(parse_stop_words(&content))
}
