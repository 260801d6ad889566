//! Typing-speed arithmetic and text comparison helpers.

use std::time::Duration;

/// Elapsed time never counts as less than this many minutes, so a burst of
/// input in the first instant gives a large finite speed instead of infinity.
pub const MIN_ELAPSED_MINUTES: f64 = 0.01;

/// Number of whitespace-separated words in `input` once trimmed.
pub fn word_count(input: &str) -> usize {
    input.split_whitespace().count()
}

/// Words per minute for `input` typed over `elapsed`, rounded to the nearest
/// integer.
pub fn words_per_minute(input: &str, elapsed: Duration) -> u32 {
    let minutes = (elapsed.as_secs_f64() / 60.0).max(MIN_ELAPSED_MINUTES);
    let wpm = (word_count(input) as f64 / minutes).round();
    // bounded by word_count / MIN_ELAPSED_MINUTES, far inside u32
    wpm as u32
}

/// Length in characters, the unit the neutral/error boundary is measured in.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Whether `input` reproduces `target`, ignoring leading and trailing
/// whitespace on both sides.
pub fn matches_target(input: &str, target: &str) -> bool {
    input.trim() == target.trim()
}
