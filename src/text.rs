//! Text cleanup shared by the transcript path and the summarizer input.

use std::sync::LazyLock;

use regex::Regex;

static ANNOTATIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)").unwrap());
static URLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:https?://|www\.)\S*").unwrap());
static FILLERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:uh-huh|u+h+m*|u+m+|e+r+m+|h+m+)\b").unwrap());

/// Sentence punctuation that survives cleaning.
const KEPT_PUNCTUATION: &[char] = &['.', ',', '!', '?', '\'', '-', ':', ';'];

/// Strips bracketed and parenthetical asides, URLs and punctuation noise, then
/// collapses whitespace. Applying it to its own output changes nothing.
pub fn clean_text(text: &str) -> String {
    let without_annotations = ANNOTATIONS.replace_all(text, " ");
    let without_urls = URLS.replace_all(&without_annotations, " ");
    let filtered: String = without_urls
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || KEPT_PUNCTUATION.contains(&c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&filtered)
}

/// [`clean_text`] plus removal of spoken filler words.
pub fn clean_transcript(text: &str) -> String {
    let cleaned = clean_text(text);
    let without_fillers = FILLERS.replace_all(&cleaned, " ");
    collapse_whitespace(&without_fillers)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Returns at most `max_chars` characters of `text`, cut at the last
/// whitespace inside the limit when there is one in its final fifth.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let head = &text[..cut];
    let floor = head.len() - head.len() / 5;
    match head.rfind(char::is_whitespace) {
        Some(idx) if idx >= floor && idx > 0 => head[..idx].trim_end(),
        _ => head,
    }
}
