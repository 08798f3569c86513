use std::time::Instant;

/// Standard word length used for WPM.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Percentage of typed chars that match the page at the same position.
///
/// Only positions inside `user_input` are compared, so untyped text never
/// counts against accuracy. Empty input is 100% accurate.
pub fn accuracy(user_input: &str, page_text: &str) -> u32 {
    let typed = user_input.chars().count();
    if typed == 0 {
        return 100;
    }

    let matching = user_input
        .chars()
        .zip(page_text.chars())
        .filter(|(typed, expected)| typed == expected)
        .count();

    ((matching as f64 / typed as f64) * 100.0).round() as u32
}

/// Words per minute since `started_at`, counting every typed char.
///
/// The result is not clamped: right after the first keystroke the elapsed
/// time is tiny and the value can be huge (it saturates at `u32::MAX`).
pub fn wpm(started_at: Option<Instant>, user_input: &str, now: Instant) -> u32 {
    let Some(started_at) = started_at else {
        return 0;
    };

    let typed = user_input.chars().count();
    if typed == 0 {
        return 0;
    }

    let elapsed_minutes = now.saturating_duration_since(started_at).as_secs_f64() / 60.0;
    let words = typed as f64 / CHARS_PER_WORD;

    (words / elapsed_minutes).round() as u32
}

/// Point-in-time view of the live session, as shown in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: u32,
    pub typed_chars: usize,
    pub page_chars: usize,
    /// 1-based, 0 when nothing is selected
    pub page_number: usize,
    pub page_count: usize,
}
