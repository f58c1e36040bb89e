use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "transcriptor",
    about = "Transcriptor - Fetch caption transcripts for YouTube videos",
    version,
    long_about = "A CLI tool for downloading the captions YouTube already has for a video, uploaded or auto-generated, without an API key. Results are cached locally to avoid repeating the request flow."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the transcript of a video
    Fetch {
        /// Video ID or URL (watch, youtu.be, embed, live or shorts)
        #[arg(value_name = "VIDEO")]
        video: String,

        /// Caption language code, e.g. en or pt-BR (first available track if not specified)
        #[arg(short, long, value_name = "LANG")]
        lang: Option<String>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Include video metadata (title, author, views, ...)
        #[arg(short, long)]
        metadata: bool,

        /// Include timestamps in text output (srt/vtt formats always include timestamps)
        #[arg(long)]
        timestamps: bool,

        /// Bypass the transcript cache
        #[arg(long)]
        no_cache: bool,

        /// Use plain http instead of https
        #[arg(long)]
        plaintext: bool,

        /// Retries per request for 429/5xx responses (overrides config)
        #[arg(long, value_name = "COUNT")]
        retries: Option<u32>,
    },

    /// List the caption tracks available for a video
    Tracks {
        /// Video ID or URL
        #[arg(value_name = "VIDEO")]
        video: String,
    },

    /// Show or locate the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON segments (with metadata when requested)
    Json,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
        }
    }
}
