use crate::core::config;

/// Escapes characters that are unsafe in file names.
///
/// Replaced characters:
/// - `/` and `\` -> `_` (path separators)
/// - `:` `*` `?` `<` `>` `|` -> `_` (reserved on Windows)
/// - `"` -> `'`
/// - control characters -> `_`
///
/// Leading/trailing whitespace and dots are trimmed. An empty result becomes
/// `unnamed`.
///
/// # Example
///
/// ```
/// use dorasong::core::utils::escape_filename;
///
/// let safe = escape_filename("song/name*.mp3");
/// assert_eq!(safe, "song_name_.mp3");
/// ```
pub fn escape_filename(filename: &str) -> String {
    let mut result = String::with_capacity(filename.len());

    for c in filename.chars() {
        match c {
            '/' | '\\' => result.push('_'),
            ':' | '*' | '?' | '<' | '>' | '|' => result.push('_'),
            '"' => result.push('\''),
            c if c.is_control() => result.push('_'),
            _ => result.push(c),
        }
    }

    let result = result.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if result.is_empty() {
        "unnamed".to_string()
    } else {
        result.to_string()
    }
}

/// Derives the on-disk base name (without extension) for a song title.
///
/// The title is cut to at most 150 characters, then the escaped name is cut
/// to at most 240 bytes on a character boundary, so long Cyrillic or CJK
/// titles still fit the 255-byte file name limit with the extension added.
///
/// # Example
///
/// ```
/// use dorasong::core::utils::title_to_filename;
///
/// assert_eq!(title_to_filename("AC/DC - Back in Black"), "AC_DC - Back in Black");
/// ```
pub fn title_to_filename(title: &str) -> String {
    let truncated: String = title.chars().take(config::download::MAX_TITLE_CHARS).collect();
    let escaped = escape_filename(truncated.trim());
    if escaped.len() <= config::download::MAX_FILENAME_BYTES {
        return escaped;
    }

    let mut end = config::download::MAX_FILENAME_BYTES;
    while !escaped.is_char_boundary(end) {
        end -= 1;
    }
    escape_filename(&escaped[..end])
}

/// Converts a byte count to mebibytes.
pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Escapes special characters for Telegram MarkdownV2.
///
/// Telegram requires escaping
/// `_`, `*`, `[`, `]`, `(`, `)`, `~`, `` ` ``, `>`, `#`, `+`, `-`, `=`, `|`, `{`, `}`, `.`, `!`
/// and the backslash itself.
///
/// # Example
///
/// ```
/// use dorasong::core::utils::escape_markdown_v2;
///
/// let escaped = escape_markdown_v2("Hello. World!");
/// assert_eq!(escaped, "Hello\\. World\\!");
/// ```
pub fn escape_markdown_v2(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|' | '{' | '}' | '.'
            | '!' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_filename_separators() {
        assert_eq!(escape_filename("a/b\\c"), "a_b_c");
        assert_eq!(escape_filename("what?*"), "what__");
        assert_eq!(escape_filename("say \"hi\""), "say 'hi'");
    }

    #[test]
    fn test_escape_filename_empty() {
        assert_eq!(escape_filename(""), "unnamed");
        assert_eq!(escape_filename(" ... "), "unnamed");
    }

    #[test]
    fn test_title_to_filename_caps_length() {
        let long = "x".repeat(400);
        assert_eq!(title_to_filename(&long).chars().count(), 150);
    }

    #[test]
    fn test_title_to_filename_multibyte() {
        let title = "Кино - Группа крови ".repeat(20);
        let name = title_to_filename(&title);
        assert!(name.chars().count() <= 150);
        assert!(name.len() <= 240);
        assert!(name.starts_with("Кино - Группа крови"));
    }

    #[test]
    fn test_title_to_filename_byte_cap_keeps_char_boundary() {
        // 150 three-byte characters would be 450 bytes
        let title = "鬼".repeat(200);
        let name = title_to_filename(&title);
        assert_eq!(name.len(), 240);
        assert!(name.chars().all(|c| c == '鬼'));

        let name = title_to_filename(&"Ж".repeat(150));
        assert_eq!(name.len(), 240);
        assert_eq!(name.chars().count(), 120);
    }

    #[test]
    fn test_title_to_filename_plain() {
        assert_eq!(title_to_filename("Shape of You"), "Shape of You");
    }

    #[test]
    fn test_bytes_to_mib() {
        assert!((bytes_to_mib(80 * 1024 * 1024) - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_escape_markdown_v2() {
        assert_eq!(escape_markdown_v2("Shape of You - Ed Sheeran"), "Shape of You \\- Ed Sheeran");
        assert_eq!(escape_markdown_v2("a\\b"), "a\\\\b");
    }
}
