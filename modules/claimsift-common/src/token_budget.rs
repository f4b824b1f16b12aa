//! Token accounting without a real tokenizer.
//!
//! Every ceiling computation in the pipeline goes through these three
//! functions so the approximation stays consistent across the run.
//! Swapping in an exact tokenizer changes only this module.

/// Rough characters-per-token ratio for English text.
const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of a text. Monotone in text length and
/// consistent across calls within one run.
pub fn count(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Truncate `text` to a prefix whose estimated token count fits
/// `max_tokens`. Idempotent; truncation lands on a char boundary, not
/// a sentence boundary.
pub fn truncate(text: &str, max_tokens: usize) -> String {
    let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Split `total` budget tokens across parts with the given desired
/// sizes. Earlier parts take precedence: each part receives as much of
/// its request as the remaining budget allows.
pub fn allocate(desired: &[usize], total: usize) -> Vec<usize> {
    let mut remaining = total;
    desired
        .iter()
        .map(|&want| {
            let granted = want.min(remaining);
            remaining -= granted;
            granted
        })
        .collect()
}
