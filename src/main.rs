use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use eyre::Result;
use log::{debug, info};

mod cli;

use cli::Cli;
use ytsum::config::{self, Config};
use ytsum::pipeline::Pipeline;
use ytsum::server::AppState;
use ytsum::summarize::{DEFAULT_API_BASE, DEFAULT_MODEL, SummaryGenerator};
use ytsum::youtube::YtDlpFetcher;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help(config: &Config) -> String {
    let yt_dlp_name = config.yt_dlp.as_deref().unwrap_or("yt-dlp");
    let yt_dlp_line = match tool_version(yt_dlp_name) {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp          {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp          (not found, needed to locate captions)".to_string(),
    };

    let key_line = if config.api_key(None).is_some() {
        format!("  \x1b[32m✅\x1b[0m {}  set", config::API_KEY_ENV)
    } else {
        format!(
            "  \x1b[33m⚠️\x1b[0m  {}  not set (local fallback summary)",
            config::API_KEY_ENV
        )
    };

    format!(
        "\nREQUIRED TOOLS:\n{yt_dlp_line}\n{key_line}\n\nConfig: {}\nLogs are written to: {}",
        config::config_path().display(),
        log_dir().join("ytsum.log").display()
    )
}

fn build_pipeline(cli: &Cli, config: &Config, client: reqwest::Client) -> Pipeline {
    let lang = cli
        .lang
        .clone()
        .or_else(|| config.default_lang.clone())
        .unwrap_or_else(|| ytsum::DEFAULT_LANG.to_string());
    let model = cli
        .model
        .as_deref()
        .or(config.model.as_deref())
        .unwrap_or(DEFAULT_MODEL);
    let api_base = config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
    let yt_dlp = config.yt_dlp.as_deref().unwrap_or("yt-dlp");

    let api_key = config.api_key(cli.api_key.as_deref());
    debug!(
        "Pipeline: lang={lang} model={model} yt-dlp={yt_dlp} api_key={}",
        if api_key.is_some() { "set" } else { "unset" }
    );

    let fetcher = Arc::new(YtDlpFetcher::new(client.clone(), yt_dlp));
    let generator = SummaryGenerator::new(client, api_key, model, api_base);
    Pipeline::new(fetcher, generator, lang)
}

async fn run_once(cli: &Cli, config: &Config, pipeline: &Pipeline) -> Result<()> {
    let url = cli
        .url
        .clone()
        .or_else(|| config.default_url.clone())
        .unwrap_or_else(|| ytsum::DEFAULT_VIDEO_URL.to_string());
    let transcript_path = cli
        .transcript_out
        .clone()
        .or_else(|| config.transcript_path.clone())
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_TRANSCRIPT_PATH));
    let summary_path = cli
        .summary_out
        .clone()
        .or_else(|| config.summary_path.clone())
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_SUMMARY_PATH));

    println!("🔍 Extracting transcript for video ID: {}", ytsum::extract_video_id(&url));
    let transcript = pipeline.transcript(&url).await?;
    println!("📝 Transcript length: {} chars", transcript.chars().count());

    ytsum::output::write_transcript(&transcript_path, &transcript)?;
    println!("✅ Transcript saved to {}", transcript_path.display());

    println!("🤖 Summarising...");
    let summary = pipeline.summarize(&transcript).await;
    println!("{}", ytsum::output::render_summary(&summary)?);

    ytsum::output::write_summary(&summary_path, &summary)?;
    println!("✅ Summary saved to {}", summary_path.display());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_default();

    let after_help = build_after_help(&config);
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    if cli.verbose {
        let config_path = config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Logs: {}", log_dir().join("ytsum.log").display());
    }

    let client = reqwest::Client::new();
    let pipeline = build_pipeline(&cli, &config, client);

    match &cli.command {
        Some(cli::Command::Serve { bind }) => {
            let addr = bind
                .clone()
                .or_else(|| config.bind.clone())
                .unwrap_or_else(|| config::DEFAULT_BIND.to_string());
            let default_url = config
                .default_url
                .clone()
                .unwrap_or_else(|| ytsum::DEFAULT_VIDEO_URL.to_string());
            let state = Arc::new(AppState { pipeline, default_url });
            ytsum::server::serve(state, &addr).await
        }
        None => run_once(&cli, &config, &pipeline).await,
    }
}
