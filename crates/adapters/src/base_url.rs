use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/v\d+/?$").unwrap());

/// Appends `/v1` to OpenAI-compatible base URLs that carry no version segment.
pub fn ensure_openai_base_url_has_v1(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let without_slash = trimmed.trim_end_matches('/');
    if VERSION_SUFFIX_RE.is_match(trimmed) || without_slash.contains("/v1/") {
        without_slash.to_string()
    } else {
        format!("{}/v1", without_slash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_v1_when_missing() {
        assert_eq!(
            ensure_openai_base_url_has_v1("https://example.com"),
            "https://example.com/v1"
        );
        assert_eq!(
            ensure_openai_base_url_has_v1("http://127.0.0.1:1234/"),
            "http://127.0.0.1:1234/v1"
        );
    }

    #[test]
    fn keeps_existing_version() {
        assert_eq!(
            ensure_openai_base_url_has_v1("https://example.com/v2"),
            "https://example.com/v2"
        );
        assert_eq!(
            ensure_openai_base_url_has_v1(" https://api.openai.com/v1/ "),
            "https://api.openai.com/v1"
        );
    }

    #[test]
    fn blank_stays_blank() {
        assert_eq!(ensure_openai_base_url_has_v1("   "), "");
    }
}
