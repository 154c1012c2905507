//! Discord length limits for replies and delivered reminders
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

/// Discord embed description limit
pub const EMBED_LIMIT: usize = 4096;
/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

const ELLIPSIS: &str = "...";

/// Truncate `text` to at most `limit` bytes on a UTF-8 boundary, marking the cut with "..."
pub fn truncate_to(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }

    let mut end = limit.saturating_sub(ELLIPSIS.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{ELLIPSIS}", &text[..end])
}

/// Truncate text to fit an embed description
pub fn truncate_for_embed(text: &str) -> String {
    truncate_to(text, EMBED_LIMIT)
}

/// Truncate text to fit message content
pub fn truncate_for_message(text: &str) -> String {
    truncate_to(text, MESSAGE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_for_message("short text"), "short text");
    }

    #[test]
    fn test_exactly_at_limit() {
        let text = "a".repeat(MESSAGE_LIMIT);
        assert_eq!(truncate_for_message(&text), text);
    }

    #[test]
    fn test_long_text_truncated_with_ellipsis() {
        let result = truncate_for_embed(&"a".repeat(5000));
        assert_eq!(result.len(), EMBED_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_utf8_safety() {
        let text = "締切".repeat(1000);
        let result = truncate_for_message(&text);
        assert!(result.len() <= MESSAGE_LIMIT);
        assert!(result.ends_with("..."));
    }
}
