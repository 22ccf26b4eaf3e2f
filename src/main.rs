use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_fetcher::cli::{Cli, Commands};
use transcript_fetcher::config::Config;
use transcript_fetcher::sources::{build_source, SourceKind};
use transcript_fetcher::{output, resolve, utils, TranscriptResolver};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    // Initialize tracing; stdout is reserved for the transcript itself
    let default_filter = if cli.verbose {
        "transcript_fetcher=debug"
    } else {
        "transcript_fetcher=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Fetch {
            input,
            language,
            output,
            format,
            backend,
            max_attempts,
            delay,
            fail_fast,
        } => {
            let mut config = Config::load()?;
            if let Some(max_attempts) = max_attempts {
                config.retry.max_attempts = max_attempts;
            }
            if let Some(delay) = delay {
                config.retry.delay_seconds = delay;
            }
            config.retry.fail_fast |= fail_fast;

            let backend = backend.unwrap_or(config.source.backend);
            warn_missing_tools(backend, &config).await;

            let language = language.unwrap_or_else(|| config.app.default_language.clone());
            let format = match format {
                Some(format) => format,
                None => config.output_format()?,
            };

            let source = build_source(backend, &config.source)?;
            let resolver = TranscriptResolver::new(source, config.retry_policy());
            let video_id = utils::video_id_from_input(&input);

            tracing::info!("Fetching '{}' transcript for: {}", language, video_id);

            let progress = spinner(quiet, format!("Fetching transcript for {}...", video_id))?;
            let result = resolver.resolve(&video_id, &language).await;
            progress.finish_and_clear();

            let resolved = result?;
            if let Some(target) = resolved.selection.translation_target() {
                tracing::info!(
                    "Transcript translated from '{}' to '{}'",
                    resolved.selection.candidate.language_code,
                    target
                );
            }

            match output {
                Some(path) => {
                    output::save_to_file(&resolved.entries, &path, format)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&resolved.entries, format)?;
                }
            }
        }
        Commands::List { input, backend } => {
            let config = Config::load()?;
            let backend = backend.unwrap_or(config.source.backend);
            warn_missing_tools(backend, &config).await;

            let source = build_source(backend, &config.source)?;
            let raw_id = utils::video_id_from_input(&input);

            let progress = spinner(quiet, format!("Listing transcripts for {}...", raw_id))?;
            let listing = resolve::list_candidates(source.as_ref(), &raw_id).await;
            progress.finish_and_clear();

            let (video_id, candidates) = listing?;
            if candidates.is_empty() {
                println!("No transcripts available for {}", video_id);
                return Ok(());
            }

            println!("Transcripts available for {}:", style(&video_id).bold());
            for candidate in &candidates {
                let translatable = if candidate.is_translatable {
                    style("translatable").green()
                } else {
                    style("not translatable").dim()
                };
                println!(
                    "  • {:<8} {:<10} {:<17} {}",
                    style(&candidate.language_code).cyan(),
                    candidate.origin.to_string(),
                    translatable,
                    candidate.language_name.as_deref().unwrap_or("")
                );
            }
        }
        Commands::Config { show, init } => {
            // Written before loading so --init can replace a broken file
            if init {
                let path = Config::default().save()?;
                println!("Default configuration written to: {}", path.display());
            }
            if show || !init {
                Config::load()?.display();
                println!("  Config File: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

/// Spinner on stderr, hidden in quiet mode
fn spinner(quiet: bool, message: String) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(120));

    Ok(progress)
}

/// Report missing external tools (non-fatal)
async fn warn_missing_tools(backend: SourceKind, config: &Config) {
    if backend != SourceKind::YtDlp {
        return;
    }

    let missing = utils::check_dependencies(&config.source.yt_dlp_path).await;
    if !missing.is_empty() {
        eprintln!("{}  Dependency check warnings:", style("⚠️").yellow());
        for dep in missing {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }
}
