//! Quote text handling: line layout for video overlays, filename and
//! character sanitising, and the source abstraction used when the caller
//! has no quote of its own.

use anyhow::Result;
use async_trait::async_trait;

/// Column width every formatted line is centred to.
pub const LINE_WIDTH: usize = 40;
/// Words per line before a forced break.
const WORDS_PER_LINE: usize = 7;
/// Line length that forces a break.
const BREAK_AT_LEN: usize = 35;

/// Centres `s` in a field of `width` columns. The left side gets the smaller
/// half of the padding; strings at least `width` long are returned as-is.
pub fn center(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let pad = width - len;
    let left = pad / 2 + (pad & width & 1);
    let right = pad - left;
    format!("{}{}{}", " ".repeat(left), s, " ".repeat(right))
}

/// Breaks a quote into centred lines for the template overlay.
///
/// A line is closed after every seventh word or as soon as it reaches 35
/// characters; closed lines end in `\n`. Whatever is left over (possibly
/// nothing) becomes the final line.
pub fn format_quote(quote: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut words = 0usize;

    for word in quote.split_whitespace() {
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
        words += 1;

        if words % WORDS_PER_LINE == 0 || line.chars().count() >= BREAK_AT_LEN {
            let mut closed = center(&line, LINE_WIDTH);
            closed.push('\n');
            lines.push(closed);
            line.clear();
            words = 0;
        }
    }

    lines.push(center(&line, LINE_WIDTH));
    lines
}

/// Strips characters that are not allowed in file names.
pub fn clean_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect()
}

/// Keeps letters, digits, `.`, `,`, `'` and whitespace.
pub fn sanitize_quote(quote: &str) -> String {
    quote
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | '\'') || c.is_whitespace())
        .collect()
}

/// Something that can hand out a quote on demand.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn next_quote(&self) -> Result<String>;
}

/// Always yields the same text.
pub struct FixedQuote(pub String);

#[async_trait]
impl QuoteSource for FixedQuote {
    async fn next_quote(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Picks the first non-blank of `explicit` and `fallback`, asking `source`
/// only when both are blank.
pub async fn resolve_quote(
    explicit: Option<&str>,
    fallback: Option<&str>,
    source: &dyn QuoteSource,
) -> Result<String> {
    for candidate in [explicit, fallback].into_iter().flatten() {
        if !candidate.trim().is_empty() {
            return Ok(candidate.to_string());
        }
    }
    source.next_quote().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_puts_extra_space_on_the_right() {
        assert_eq!(center("abc", 8), "  abc   ");
        assert_eq!(center("ab", 8), "   ab   ");
        assert_eq!(center("", 4), "    ");
        assert_eq!(center("toolong", 4), "toolong");
    }

    #[test]
    fn short_quote_is_one_centred_line() {
        let lines = format_quote("Stay hungry.");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), LINE_WIDTH);
        assert_eq!(lines[0].trim(), "Stay hungry.");
        assert!(!lines[0].ends_with('\n'));
    }

    #[test]
    fn seventh_word_closes_a_line() {
        let lines = format_quote("a b c d e f g h");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("{}\n", center("a b c d e f g", LINE_WIDTH)));
        assert_eq!(lines[1], center("h", LINE_WIDTH));
    }

    #[test]
    fn long_line_breaks_at_thirty_five_chars() {
        let quote = "The impediment to action advances action. What stands in the way becomes the way.";
        let lines = format_quote(quote);
        for closed in &lines[..lines.len() - 1] {
            assert!(closed.ends_with('\n'));
            assert!(closed.trim().len() >= BREAK_AT_LEN || closed.split_whitespace().count() == 7);
        }
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
        assert_eq!(rejoined.join(" "), quote);
    }

    #[test]
    fn exact_break_leaves_blank_last_line() {
        let lines = format_quote("one two three four five six seven");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], " ".repeat(LINE_WIDTH));
    }

    #[test]
    fn empty_quote_is_a_blank_line() {
        assert_eq!(format_quote("   "), vec![" ".repeat(LINE_WIDTH)]);
    }

    #[test]
    fn filename_and_quote_cleaning() {
        assert_eq!(clean_filename(r#"What? "Why" a/b\c:d*e|f<g>"#), "What Why abcdefg");
        assert_eq!(sanitize_quote("Hello — world! It's 5:00, ok."), "Hello  world It's 500, ok.");
    }

    #[tokio::test]
    async fn resolve_prefers_explicit_then_fallback() {
        let source = FixedQuote("from source".into());
        assert_eq!(resolve_quote(Some("mine"), Some("default"), &source).await.unwrap(), "mine");
        assert_eq!(resolve_quote(Some("  "), Some("default"), &source).await.unwrap(), "default");
        assert_eq!(resolve_quote(None, None, &source).await.unwrap(), "from source");
    }
}
