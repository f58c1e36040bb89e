use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_fetch::cli::{Cli, Commands};
use transcript_fetch::config::Config;
use transcript_fetch::output;
use transcript_fetch::transcribe::FetchRequest;
use transcript_fetch::{CancellationToken, TranscriptPipeline};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "transcript_fetch=debug,transcriptor=debug"
    } else {
        "transcript_fetch=info,transcriptor=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load().await?;

    // Ctrl-C aborts whatever request or backoff is in flight
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    match cli.command {
        Commands::Fetch {
            video,
            lang,
            output,
            format,
            metadata,
            timestamps,
            no_cache,
            plaintext,
            retries,
        } => {
            let mut options = config.pipeline_options();
            options.plaintext |= plaintext;
            if let Some(retries) = retries {
                options.retry.max_attempts = retries;
            }

            let mut pipeline = TranscriptPipeline::new(options);
            if !no_cache {
                if let Some(cache) = config.build_cache() {
                    pipeline = pipeline.with_cache(cache, Some(config.cache_ttl()));
                }
            }

            let mut request = FetchRequest::new().with_metadata(metadata).cancel_on(cancel);
            request.lang = lang;

            tracing::debug!("Fetching transcript for: {}", video);
            let progress = spinner(cli.quiet, "Fetching transcript...");
            let result = pipeline.fetch(&video, &request).await;
            progress.finish_and_clear();
            let result = result?;

            let format = format.unwrap_or_else(|| config.output.default_format.clone());
            let show_timestamps = timestamps || config.output.timestamps;
            match output {
                Some(path) => {
                    output::save_to_file(&result, &path, &format, show_timestamps)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&result, &format, show_timestamps)?;
                }
            }
        }
        Commands::Tracks { video } => {
            let pipeline = TranscriptPipeline::new(config.pipeline_options());

            let progress = spinner(cli.quiet, "Listing caption tracks...");
            let tracks = pipeline.list_tracks(&video, cancel).await;
            progress.finish_and_clear();

            println!("Available caption tracks:");
            for track in tracks? {
                let kind = if track.is_generated { "auto-generated" } else { "uploaded" };
                println!("  • {:<8} {} ({})", track.language_code, track.name, kind);
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            }
            println!("Config file: {}", Config::config_path()?.display());
        }
    }

    Ok(())
}

fn spinner(quiet: bool, message: &'static str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        progress.set_style(template);
    }
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
