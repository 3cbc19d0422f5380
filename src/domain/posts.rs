//! Pure helpers shared by every path that writes a post.

use url::form_urlencoded::byte_serialize;

pub const WORDS_PER_MINUTE: usize = 200;
pub const EXCERPT_FALLBACK_CHARS: usize = 200;
pub const DEFAULT_AUTHOR_NAME: &str = "Admin";

const COVER_IMAGE_BASE: &str = "https://source.unsplash.com/1200x600/?";

/// Estimated reading time in whole minutes, never less than one.
pub fn reading_time_minutes(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

/// First `EXCERPT_FALLBACK_CHARS` characters of `text` followed by an ellipsis.
pub fn truncated_excerpt(text: &str) -> String {
    let mut excerpt: String = text.chars().take(EXCERPT_FALLBACK_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}

/// Stock cover image for a search keyword.
pub fn cover_image_url(keyword: &str) -> String {
    // form encoding escapes a literal `+` as `%2B`, so every remaining `+` is a space
    let encoded: String = byte_serialize(keyword.trim().as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("{COVER_IMAGE_BASE}{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_time_rounds_up_and_has_a_floor() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes("one two three"), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(200)), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(201)), 2);
        assert_eq!(reading_time_minutes(&"word ".repeat(1000)), 5);
    }

    #[test]
    fn truncated_excerpt_counts_characters() {
        let text = "é".repeat(250);
        let excerpt = truncated_excerpt(&text);
        assert_eq!(excerpt.chars().count(), 203);
        assert!(excerpt.ends_with("..."));

        assert_eq!(truncated_excerpt("short"), "short...");
    }

    #[test]
    fn cover_image_url_encodes_keyword() {
        assert_eq!(
            cover_image_url("AI"),
            "https://source.unsplash.com/1200x600/?AI"
        );
        assert_eq!(
            cover_image_url("Web Development"),
            "https://source.unsplash.com/1200x600/?Web%20Development"
        );
        assert_eq!(
            cover_image_url("C++"),
            "https://source.unsplash.com/1200x600/?C%2B%2B"
        );
    }
}
