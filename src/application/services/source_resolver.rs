//! Turns user-supplied source strings into typed image requests.

use std::path::Path;

use crate::domain::entities::ImageRequest;

/// Classifies a single source string.
///
/// Anything with an `http://` or `https://` scheme is a remote resource;
/// everything else is treated as a filesystem path. Existence is not checked
/// here: a missing file surfaces later as the widget's fallback state.
#[must_use]
pub fn classify(input: &str) -> ImageRequest {
    let lower = input.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        ImageRequest::url(input)
    } else {
        ImageRequest::file(Path::new(input))
    }
}

/// Resolves the CLI source list into requests, preserving order.
#[must_use]
pub fn resolve_sources(inputs: &[String]) -> Vec<ImageRequest> {
    inputs.iter().map(|s| classify(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://example.com/a.png", true ; "https url")]
    #[test_case("http://example.com/a.png", true ; "http url")]
    #[test_case("HTTPS://EXAMPLE.COM/A.PNG", true ; "uppercase scheme")]
    #[test_case("./photos/a.png", false ; "relative path")]
    #[test_case("/tmp/a.png", false ; "absolute path")]
    #[test_case("httpdocs/a.png", false ; "path starting with http")]
    fn test_classify(input: &str, remote: bool) {
        assert_eq!(classify(input).is_remote(), remote);
    }

    #[test]
    fn test_resolve_sources_preserves_order() {
        let inputs = vec![
            "first.png".to_string(),
            "https://example.com/second.png".to_string(),
        ];
        let requests = resolve_sources(&inputs);
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].is_remote());
        assert!(requests[1].is_remote());
    }
}
