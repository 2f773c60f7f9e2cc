use regex::Regex;
use std::sync::LazyLock;

static POST_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?instagram\.com/(?:p|reel|tv)/([A-Za-z0-9_-]+)")
        .expect("post URL pattern is valid")
});

static BARE_SHORTCODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{5,}$").expect("shortcode pattern is valid"));

/// Extract a post shortcode from a pasted link or a bare shortcode.
///
/// Links are matched anywhere in the input, so query strings, trailing
/// path segments and surrounding text are tolerated.
pub fn extract_shortcode(input: &str) -> Option<String> {
    let candidate = input.trim();

    if let Some(caps) = POST_URL_PATTERN.captures(candidate) {
        return Some(caps[1].to_string());
    }

    if BARE_SHORTCODE_PATTERN.is_match(candidate) {
        return Some(candidate.to_string());
    }

    None
}

/// Normalize one line of downloader output for the log panel.
/// Blank lines are dropped.
pub fn format_log_line(raw: &str) -> Option<String> {
    let line = raw.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_shortcode_from_urls() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/p/ABC123xyz/"),
            Some("ABC123xyz".to_string())
        );
        assert_eq!(
            extract_shortcode("http://instagram.com/reel/C_d-9x1/?igsh=abc"),
            Some("C_d-9x1".to_string())
        );
        assert_eq!(
            extract_shortcode("instagram.com/tv/B8xyz12"),
            Some("B8xyz12".to_string())
        );
        assert_eq!(
            extract_shortcode("  look at https://www.instagram.com/p/Qq_1-2/ please "),
            Some("Qq_1-2".to_string())
        );
    }

    #[test]
    fn test_extract_short_shortcode_from_url() {
        // The length rule only applies to bare shortcodes
        assert_eq!(
            extract_shortcode("https://www.instagram.com/p/ab/"),
            Some("ab".to_string())
        );
    }

    #[test]
    fn test_extract_bare_shortcode() {
        assert_eq!(extract_shortcode("ABC123xyz"), Some("ABC123xyz".to_string()));
        assert_eq!(extract_shortcode("  a_b-c  "), Some("a_b-c".to_string()));
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert_eq!(extract_shortcode("not a link"), None);
        assert_eq!(extract_shortcode(""), None);
        assert_eq!(extract_shortcode("abcd"), None);
        assert_eq!(extract_shortcode("https://www.instagram.com/someprofile/"), None);
        assert_eq!(extract_shortcode("https://example.com/p/ABC123xyz/"), None);
        assert_eq!(extract_shortcode("abc$defgh"), None);
    }

    #[test]
    fn test_format_log_line() {
        assert_eq!(format_log_line("  [1/2] saved \n"), Some("[1/2] saved".to_string()));
        assert_eq!(format_log_line("   "), None);
    }
}
