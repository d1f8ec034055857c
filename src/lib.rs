pub mod captions;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod summarize;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;

/// Video used when no URL is supplied
pub const DEFAULT_VIDEO_URL: &str = "https://www.youtube.com/watch?v=Kw4UHNnilPY";

/// Caption language requested when none is configured
pub const DEFAULT_LANG: &str = "en";

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|youtu\.be/)([\w-]{11})").expect("video id regex"));

/// Extract the 11-character video ID from a watch or short URL.
///
/// Returns an empty string when the URL is not recognized. Only used for diagnostics,
/// the fetcher works from the full URL.
pub fn extract_video_id(url: &str) -> String {
    VIDEO_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=120"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_hyphen_and_underscore_ids() {
        assert_eq!(extract_video_id("https://youtu.be/a-b_c-d_e-f?si=xyz"), "a-b_c-d_e-f");
    }

    #[test]
    fn test_unrecognized_url() {
        assert_eq!(extract_video_id("https://example.com/"), "");
    }

    #[test]
    fn test_id_too_short() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=abc"), "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_video_id(""), "");
    }
}
