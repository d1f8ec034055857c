use std::sync::Arc;

use eyre::Result;
use log::{info, warn};

use crate::captions::clean_caption_text;
use crate::summarize::{Summary, SummaryGenerator};
use crate::youtube::CaptionFetcher;

/// Fetch → normalize → summarize, shared by the CLI and the HTTP server
pub struct Pipeline {
    fetcher: Arc<dyn CaptionFetcher>,
    generator: SummaryGenerator,
    lang: String,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn CaptionFetcher>, generator: SummaryGenerator, lang: impl Into<String>) -> Self {
        Self {
            fetcher,
            generator,
            lang: lang.into(),
        }
    }

    /// Download the caption track for `url` and clean it into plain text.
    pub async fn transcript(&self, url: &str) -> Result<String> {
        let raw = self.fetcher.fetch(url, &self.lang).await?;
        let transcript = clean_caption_text(&raw);
        if transcript.is_empty() {
            warn!("Caption track for {url} produced an empty transcript");
        }
        Ok(transcript)
    }

    /// Summarize an already cleaned transcript. Never fails.
    pub async fn summarize(&self, transcript: &str) -> Summary {
        self.generator.summarize(transcript).await
    }

    pub async fn run(&self, url: &str) -> Result<(String, Summary)> {
        let transcript = self.transcript(url).await?;
        info!("Transcript length: {} chars", transcript.chars().count());
        let summary = self.summarize(&transcript).await;
        Ok((transcript, summary))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use eyre::bail;

    use crate::summarize::{EMPTY_TRANSCRIPT_SUMMARY, FALLBACK_TITLE};

    /// Fetcher returning a canned caption file
    pub(crate) struct StaticFetcher(pub &'static str);

    #[async_trait]
    impl CaptionFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str, _lang: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    /// Fetcher that always fails like a video without captions
    pub(crate) struct NoCaptionsFetcher;

    #[async_trait]
    impl CaptionFetcher for NoCaptionsFetcher {
        async fn fetch(&self, _url: &str, _lang: &str) -> Result<String> {
            bail!("No transcript available for this video / language.")
        }
    }

    const SAMPLE_SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nWelcome back\n\n\
        2\n00:00:02,000 --> 00:00:04,000\nWelcome back\n\n\
        3\n00:00:04,000 --> 00:00:06,000\n<i>today</i> we cook &amp; eat\n\n\
        4\n00:00:06,000 --> 00:00:07,000\n[MUSIC]\n";

    #[tokio::test]
    async fn test_run_end_to_end_local() {
        let pipeline = Pipeline::new(Arc::new(StaticFetcher(SAMPLE_SRT)), SummaryGenerator::local_only(), "en");
        let (transcript, summary) = pipeline.run("https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(transcript, "Welcome back\ntoday we cook & eat");
        assert_eq!(summary.topic_name, FALLBACK_TITLE);
        assert_eq!(summary.topic_summary, "Welcome back today we cook & eat");
    }

    #[tokio::test]
    async fn test_run_propagates_fetch_error() {
        let pipeline = Pipeline::new(Arc::new(NoCaptionsFetcher), SummaryGenerator::local_only(), "en");
        let err = pipeline.run("https://youtu.be/dQw4w9WgXcQ").await.unwrap_err();
        assert!(err.to_string().contains("No transcript available"));
    }

    #[tokio::test]
    async fn test_empty_captions_summarize_to_placeholder() {
        let pipeline = Pipeline::new(
            Arc::new(StaticFetcher("00:00:00.000 --> 00:00:01.000\n[Music]\n\n00:00:01.000 --> 00:00:02.000\n[Applause]\n")),
            SummaryGenerator::local_only(),
            "en",
        );
        let (transcript, summary) = pipeline.run("https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(transcript, "");
        assert_eq!(summary.topic_summary, EMPTY_TRANSCRIPT_SUMMARY);
    }
}
