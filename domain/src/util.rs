//! Shared string helpers.

/// Truncate to at most `max_chars` characters, appending `…` when cut.
///
/// The ellipsis counts toward the cap, so the result never exceeds
/// `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

/// First sentence of `text`: everything up to and including the first
/// `.`, `!` or `?` that is followed by whitespace or the end of the text.
pub fn first_sentence(text: &str) -> &str {
    let trimmed = text.trim();
    let mut chars = trimmed.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = match chars.peek() {
                None => true,
                Some((_, next)) => next.is_whitespace(),
            };
            if at_boundary {
                return &trimmed[..idx + c.len_utf8()];
            }
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn truncate_counts_ellipsis() {
        let out = truncate_chars("hello world", 6);
        assert_eq!(out, "hello…");
        assert_eq!(out.chars().count(), 6);
    }

    #[test]
    fn truncate_multibyte() {
        assert_eq!(truncate_chars("あのねあのね", 3), "あの…");
    }

    #[test]
    fn truncate_zero() {
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn first_sentence_stops_at_terminator() {
        assert_eq!(first_sentence("Use caching. It helps."), "Use caching.");
        assert_eq!(first_sentence("  Really? yes  "), "Really?");
    }

    #[test]
    fn first_sentence_ignores_inner_dots() {
        assert_eq!(first_sentence("Bump to v1.2 now"), "Bump to v1.2 now");
        assert_eq!(first_sentence("See e.g. this. Then"), "See e.g.");
    }
}
