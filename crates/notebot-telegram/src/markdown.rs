//! MarkdownV2 escaping.

/// Escape text for Telegram MarkdownV2.
///
/// Characters escaped: `_ * [ ] ( ) ~ ` > # + - = | { } . !` and the
/// backslash itself.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|'
            | '{' | '}' | '.' | '!' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(escape_markdown("Groceries list"), "Groceries list");
    }

    #[test]
    fn test_url_is_escaped() {
        assert_eq!(
            escape_markdown("https://a.example/x_y?q=1"),
            "https://a\\.example/x\\_y?q\\=1"
        );
    }

    #[test]
    fn test_formatting_characters_escaped() {
        assert_eq!(escape_markdown("*bold* [x](y)!"), "\\*bold\\* \\[x\\]\\(y\\)\\!");
    }

    #[test]
    fn test_backslash_escaped() {
        assert_eq!(escape_markdown("a\\b"), "a\\\\b");
    }
}
