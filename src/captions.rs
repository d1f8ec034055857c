use std::sync::LazyLock;

use regex::Regex;

static CUE_INDEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("cue index regex"));

// WebVTT uses `.` before the milliseconds, SRT uses `,`
static VTT_TIMING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}\.\d+\s+-->").expect("vtt timing regex"));
static SRT_TIMING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2},\d{3}\s+-->").expect("srt timing regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));

/// Turn a WebVTT or SRT caption file into a plain-text transcript.
///
/// Cue indices, timing lines, positioning metadata, inline tags and bracketed
/// annotations such as `[Music]` are removed. Captions that repeat across
/// consecutive cues collapse to one line; repeats further apart are kept.
pub fn clean_caption_text(raw: &str) -> String {
    let mut kept: Vec<String> = Vec::new();

    for line in split_lines(raw.trim()) {
        let Some(text) = clean_line(line) else {
            continue;
        };
        if kept.last() != Some(&text) {
            kept.push(text);
        }
    }

    kept.join("\n")
}

fn clean_line(line: &str) -> Option<String> {
    if CUE_INDEX_RE.is_match(line) {
        return None;
    }
    if VTT_TIMING_RE.is_match(line) || SRT_TIMING_RE.is_match(line) {
        return None;
    }
    if line.contains("align:") || line.contains("position:") {
        return None;
    }

    let stripped = TAG_RE.replace_all(line, "");
    let decoded = html_escape::decode_html_entities(&stripped);
    let text = decoded.trim();

    if text.is_empty() || is_annotation(text) {
        return None;
    }
    Some(text.to_string())
}

fn is_annotation(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']')
}

/// Split on every line boundary caption files use in the wild, including a
/// bare `\r`, form feeds and the Unicode line/paragraph separators.
///
/// `\r\n` yields an extra empty piece; callers skip blank lines anyway.
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}'])
}
