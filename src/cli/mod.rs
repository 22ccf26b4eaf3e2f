use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::sources::SourceKind;

#[derive(Parser)]
#[command(
    name = "fetch-transcript",
    about = "Fetch the best available transcript for a YouTube video",
    version,
    long_about = "Fetches a YouTube transcript, preferring generated captions in the requested language, then manual ones, then a translation of the first translatable track. The whole resolution is retried with a fixed delay when it fails."
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
    /// Fetch a transcript, retrying on failure
    Fetch {
        /// Video URL or bare video ID
        #[arg(value_name = "URL_OR_ID")]
        input: String,

        /// Preferred transcript language (defaults to the configured language)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Transcript backend
        #[arg(short, long, value_enum, env = "FETCH_TRANSCRIPT_BACKEND")]
        backend: Option<SourceKind>,

        /// Total number of attempts
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        max_attempts: Option<u32>,

        /// Seconds to wait between attempts
        #[arg(long, value_name = "SECS")]
        delay: Option<u64>,

        /// Give up immediately on invalid IDs and missing transcripts
        #[arg(long)]
        fail_fast: bool,
    },

    /// List the transcripts available for a video
    List {
        /// Video URL or bare video ID
        #[arg(value_name = "URL_OR_ID")]
        input: String,

        /// Transcript backend
        #[arg(short, long, value_enum, env = "FETCH_TRANSCRIPT_BACKEND")]
        backend: Option<SourceKind>,
    },

    /// Show or initialise the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON list of {text, start, duration}
    Json,
    /// YAML list of {text, start, duration}
    Yaml,
    /// CSV with a text,start,duration header
    Csv,
    /// Plain text, one entry per line
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}
