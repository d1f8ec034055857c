use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use eyre::{Result, WrapErr};
use log::{info, warn};
use serde_json::{Value, json};

use crate::extract_video_id;
use crate::pipeline::Pipeline;

/// Shared state for request handlers
pub struct AppState {
    pub pipeline: Pipeline,
    pub default_url: String,
}

#[derive(Debug, Default)]
pub struct SummarizeParams {
    pub url: Option<String>,
}

impl SummarizeParams {
    /// A repeated `url` parameter resolves to its last value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let url = pairs.into_iter().filter(|(k, _)| k == "url").map(|(_, v)| v).last();
        Self { url }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/summarize", get(summarize)).with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("could not bind {addr}"))?;
    info!("Listening on {addr}");
    println!("Serving GET /summarize on http://{addr}");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// `GET /summarize?url=...`
///
/// Errors, including an unparseable query string, are reported as
/// `{"error": "..."}` with a 200 status, so clients only need to inspect the body.
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Json<Value> {
    let params = match query {
        Ok(Query(pairs)) => SummarizeParams::from_pairs(pairs),
        Err(rejection) => {
            warn!("Rejected query string: {rejection}");
            return Json(json!({ "error": rejection.body_text() }));
        }
    };
    let url = params
        .url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| state.default_url.clone());

    info!("Extracting transcript for video ID: {}", extract_video_id(&url));

    match state.pipeline.run(&url).await {
        Ok((_, summary)) => Json(json!(summary)),
        Err(e) => {
            warn!("Summarizing {url} failed: {e:#}");
            Json(json!({ "error": format!("{e:#}") }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::pipeline::tests::{NoCaptionsFetcher, StaticFetcher};
    use crate::summarize::{FALLBACK_TITLE, SummaryGenerator};
    use crate::youtube::CaptionFetcher;

    /// Fetcher whose caption text is the URL it was asked for
    struct EchoFetcher;

    #[async_trait]
    impl CaptionFetcher for EchoFetcher {
        async fn fetch(&self, url: &str, _lang: &str) -> eyre::Result<String> {
            Ok(url.to_string())
        }
    }

    fn state(pipeline: Pipeline) -> Arc<AppState> {
        Arc::new(AppState {
            pipeline,
            default_url: crate::DEFAULT_VIDEO_URL.to_string(),
        })
    }

    fn query(uri: &str) -> Result<Query<Vec<(String, String)>>, QueryRejection> {
        Query::try_from_uri(&uri.parse::<axum::http::Uri>().unwrap())
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_error_body() {
        let pipeline = Pipeline::new(Arc::new(NoCaptionsFetcher), SummaryGenerator::local_only(), "en");
        let Json(body) = summarize(State(state(pipeline)), query("/summarize")).await;

        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(
            obj["error"].as_str().unwrap(),
            "No transcript available for this video / language."
        );
    }

    #[tokio::test]
    async fn test_success_returns_summary_fields() {
        let pipeline = Pipeline::new(
            Arc::new(StaticFetcher("1\n00:00:01.000 --> 00:00:02.000\nHello world\n")),
            SummaryGenerator::local_only(),
            "en",
        );
        let Json(body) = summarize(
            State(state(pipeline)),
            query("/summarize?url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3DdQw4w9WgXcQ"),
        )
        .await;

        assert_eq!(body, json!({"topic_name": FALLBACK_TITLE, "topic_summary": "Hello world"}));
    }

    #[tokio::test]
    async fn test_missing_url_uses_default() {
        let pipeline = Pipeline::new(Arc::new(EchoFetcher), SummaryGenerator::local_only(), "en");
        let Json(body) = summarize(State(state(pipeline)), query("/summarize")).await;
        assert_eq!(body["topic_summary"], crate::DEFAULT_VIDEO_URL);
    }

    #[tokio::test]
    async fn test_blank_url_uses_default() {
        let pipeline = Pipeline::new(Arc::new(EchoFetcher), SummaryGenerator::local_only(), "en");
        let Json(body) = summarize(State(state(pipeline)), query("/summarize?url=%20%20")).await;
        assert_eq!(body["topic_summary"], crate::DEFAULT_VIDEO_URL);
    }

    #[tokio::test]
    async fn test_repeated_url_takes_last_value() {
        let pipeline = Pipeline::new(Arc::new(EchoFetcher), SummaryGenerator::local_only(), "en");
        let Json(body) = summarize(
            State(state(pipeline)),
            query("/summarize?url=https://youtu.be/aaaaaaaaaaa&url=https://youtu.be/bbbbbbbbbbb"),
        )
        .await;

        let obj = body.as_object().unwrap();
        assert!(!obj.contains_key("error"));
        assert_eq!(obj["topic_summary"], "https://youtu.be/bbbbbbbbbbb");
    }

    #[test]
    fn test_params_ignore_other_keys() {
        let params = SummarizeParams::from_pairs(vec![("lang".to_string(), "de".to_string())]);
        assert!(params.url.is_none());
    }
}
