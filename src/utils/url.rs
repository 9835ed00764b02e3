//! Endpoint construction for provider base URLs.

/// Strip trailing slashes so endpoint joins never produce `//`.
///
/// ```
/// use english_tutor::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.example.com/v1///"), "https://api.example.com/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path.
///
/// ```
/// use english_tutor::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.example.com/v1/", "/chat/completions"),
///     "https://api.example.com/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Gemini authenticates with a `key` query parameter rather than a header.
pub fn construct_gemini_url(base_url: &str, endpoint: &str, api_key: &str, sse: bool) -> String {
    let url = construct_api_url(base_url, endpoint);
    let separator = if url.contains('?') { '&' } else { '?' };
    if sse {
        format!("{url}{separator}alt=sse&key={api_key}")
    } else {
        format!("{url}{separator}key={api_key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_without_double_slashes() {
        assert_eq!(
            construct_api_url("https://api.openai.com/v1", "models"),
            "https://api.openai.com/v1/models"
        );
        assert_eq!(
            construct_api_url("https://api.openai.com/v1//", "//models"),
            "https://api.openai.com/v1/models"
        );
    }

    #[test]
    fn gemini_urls_carry_key_and_sse_flag() {
        assert_eq!(
            construct_gemini_url(
                "https://generativelanguage.googleapis.com/v1beta/",
                "models/gemini-2.0-flash:streamGenerateContent",
                "k",
                true
            ),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse&key=k"
        );
        assert_eq!(
            construct_gemini_url("https://g.example/v1beta", "models", "k", false),
            "https://g.example/v1beta/models?key=k"
        );
    }
}
