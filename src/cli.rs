use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "Summarize a YouTube video from its captions",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// YouTube video URL (defaults to the configured sample video)
    pub url: Option<String>,

    /// Caption language
    #[arg(short, long, global = true)]
    pub lang: Option<String>,

    /// Gemini model used for summarization
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Gemini API key (overrides GEMINI_API_KEY and the config file)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Where to write the cleaned transcript
    #[arg(long)]
    pub transcript_out: Option<PathBuf>,

    /// Where to write the summary JSON
    #[arg(long)]
    pub summary_out: Option<PathBuf>,

    /// Show config and collaborator details
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve GET /summarize over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,
    },
}
