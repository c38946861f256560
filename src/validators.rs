//! Input validation for admin writes and the contact form.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();

    /// scheme://host[:port][/rest], host made of dotted labels or `localhost`.
    static ref URL_REGEX: Regex = Regex::new(
        r"^(?i)https?://(localhost|([a-z0-9]([a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,})(:[0-9]{1,5})?([/?#][^\s]*)?$"
    )
    .unwrap();

    static ref PHONE_STRIP: Regex = Regex::new(r"[\s()\-.]").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{10,15}$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

/// Accepts absolute http(s) URLs; a bare host gets `https://` prepended first.
pub fn is_valid_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        URL_REGEX.is_match(url)
    } else {
        URL_REGEX.is_match(&format!("https://{}", url))
    }
}

/// Image references stored on records: http(s) URLs, site-relative paths or inline data URLs.
pub fn is_valid_image_ref(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("data:image/")
        || (value.starts_with('/') && !value.starts_with("//"))
        || is_valid_url(value)
}

/// Phone numbers with 10-15 digits, optional leading `+`, common separators ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(&PHONE_STRIP.replace_all(phone.trim(), ""))
}

pub fn is_required(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_valid_length(value: &str, min: usize, max: usize) -> bool {
    let len = value.trim().chars().count();
    len >= min && len <= max
}

/// Escape markup in plain-text fields forwarded to third parties.
pub fn sanitize_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Strip scripts and unsafe attributes from editor-supplied HTML.
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("contact@motionwealthgroup.com"));
        assert!(is_valid_email("  first.last@mail.example.edu "));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://twitter.com/motionwealthgrp"));
        assert!(is_valid_url("http://localhost:3000/blog"));
        assert!(is_valid_url("www.youraffiliatelink.com/trading-course"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("javascript:alert(1)"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("ftp://example.com"));
    }

    #[test]
    fn test_image_ref_validation() {
        assert!(is_valid_image_ref("/uploads/blogImages/chart_1.png"));
        assert!(is_valid_image_ref("data:image/png;base64,AAAA"));
        assert!(is_valid_image_ref("https://images.unsplash.com/photo-1"));
        assert!(!is_valid_image_ref("//evil.example.com/x.png"));
        assert!(!is_valid_image_ref("data:text/html,hi"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("(555) 123-4567"));
        assert!(is_valid_phone("+44 20 7946 0958"));
        assert!(!is_valid_phone("123"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        assert!(is_valid_length("héllo", 5, 5));
        assert!(!is_valid_length("   ", 1, 10));
    }

    #[test]
    fn test_sanitize_text_escapes_markup() {
        assert_eq!(
            sanitize_text(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#039;Jerry&#039;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_sanitize_html_strips_scripts() {
        let cleaned = sanitize_html("<p>Hi</p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>Hi</p>");
    }
}
