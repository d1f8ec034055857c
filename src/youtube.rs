use std::collections::HashMap;
use std::process::Stdio;

use async_trait::async_trait;
use eyre::{Result, WrapErr, bail};
use log::debug;
use serde::Deserialize;
use tokio::process::Command;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Source of raw caption files for a video URL
#[async_trait]
pub trait CaptionFetcher: Send + Sync {
    /// Return the raw WebVTT/SRT text of the caption track for `lang`.
    async fn fetch(&self, url: &str, lang: &str) -> Result<String>;
}

/// Subset of the `yt-dlp --dump-single-json` payload
#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitles: Option<HashMap<String, Vec<SubtitleEntry>>>,
    #[serde(default)]
    automatic_captions: Option<HashMap<String, Vec<SubtitleEntry>>>,
}

#[derive(Debug, Clone, Deserialize)]
struct SubtitleEntry {
    url: Option<String>,
    ext: Option<String>,
}

/// A downloadable caption file for one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub url: String,
    pub language: String,
    pub ext: Option<String>,
}

/// Locates caption tracks with `yt-dlp` and downloads them over HTTP
pub struct YtDlpFetcher {
    client: reqwest::Client,
    program: String,
}

impl YtDlpFetcher {
    pub fn new(client: reqwest::Client, program: impl Into<String>) -> Self {
        Self {
            client,
            program: program.into(),
        }
    }

    async fn video_info(&self, url: &str) -> Result<VideoInfo> {
        if url.trim_start().starts_with('-') {
            bail!("invalid video URL: {url}");
        }
        debug!("Running {} --dump-single-json for {url}", self.program);

        let output = Command::new(&self.program)
            .args(["--dump-single-json", "--skip-download", "--no-playlist", "--no-warnings", "--", url])
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!(
                    "{} not found. Install it to fetch captions:\n  \
                     pip install yt-dlp\n  \
                     or: brew install yt-dlp",
                    self.program
                );
            }
            Err(e) => bail!("failed to run {}: {e}", self.program),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} exited with status {}: {}", self.program, output.status, stderr.trim());
        }

        parse_video_info(&output.stdout)
    }
}

#[async_trait]
impl CaptionFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, lang: &str) -> Result<String> {
        let info = self.video_info(url).await?;
        debug!("Video title: {}", info.title.as_deref().unwrap_or("<unknown>"));

        let Some(track) = select_track(&info, lang) else {
            bail!("No transcript available for this video / language.");
        };
        debug!(
            "Using caption track: lang={} ext={}",
            track.language,
            track.ext.as_deref().unwrap_or("?")
        );

        let text = self
            .client
            .get(&track.url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
            .wrap_err("failed to download caption file")?;

        debug!("Downloaded {} bytes of captions", text.len());
        Ok(text)
    }
}

fn parse_video_info(stdout: &[u8]) -> Result<VideoInfo> {
    serde_json::from_slice(stdout).wrap_err("could not parse yt-dlp metadata")
}

/// Pick the caption track for `lang`: manual subtitles win over automatic
/// captions, and the last listed format is used.
fn select_track(info: &VideoInfo, lang: &str) -> Option<CaptionTrack> {
    let entries = [&info.subtitles, &info.automatic_captions]
        .into_iter()
        .filter_map(|map| map.as_ref()?.get(lang))
        .find(|entries| !entries.is_empty())?;

    let last = entries.last()?;
    Some(CaptionTrack {
        url: last.url.clone()?,
        language: lang.to_string(),
        ext: last.ext.clone(),
    })
}
