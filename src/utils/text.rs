//! Text heuristics for rejecting binary-looking input.

/// Fraction of characters that are printable or ordinary whitespace.
///
/// Returns 1.0 for empty text.
pub fn printable_ratio(text: &str) -> f32 {
    let mut total = 0usize;
    let mut printable = 0usize;
    for c in text.chars() {
        total += 1;
        if !c.is_control() || matches!(c, '\n' | '\r' | '\t') {
            printable += 1;
        }
    }
    if total == 0 {
        return 1.0;
    }
    printable as f32 / total as f32
}
