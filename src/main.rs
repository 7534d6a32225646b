mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mediasweep::config::Config;
use mediasweep::downloader;
use mediasweep::extractor::{ExtractRules, IMAGE_EXT_DEFAULT, VIDEO_EXT_DEFAULT};
use mediasweep::format::{human_bytes, human_kb};
use mediasweep::preferences::Preferences;
use mediasweep::scan::{self, ScanOptions};
use mediasweep::selection::{self, Selection};
use mediasweep::{FetchMode, MediaItem, RenderController};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn extract_rules(cli: &Cli) -> ExtractRules {
    let images: Vec<String> = if cli.images.is_empty() {
        IMAGE_EXT_DEFAULT.iter().map(|e| e.to_string()).collect()
    } else {
        cli.images.clone()
    };
    let videos: Vec<String> = if cli.videos.is_empty() {
        VIDEO_EXT_DEFAULT.iter().map(|e| e.to_string()).collect()
    } else {
        cli.videos.clone()
    };
    ExtractRules::new(images, videos)
}

fn print_items(items: &[MediaItem]) {
    for (n, item) in items.iter().enumerate() {
        println!(
            "{:>4}  {:<5}  {:>10}  {}",
            n + 1,
            item.kind(),
            human_bytes(item.size_bytes),
            item.url()
        );
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let mut config = Config::from_env()?
        .with_chrome_path(cli.chrome_path.clone())
        .with_download_dir(cli.dir.clone());
    if let Some(concurrency) = cli.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(channel) = cli.channel {
        config = config.with_browser_channel(channel);
    }

    let controller = RenderController::new(Arc::new(config.renderer()), config.browser_channel());
    let options = ScanOptions {
        mode: if cli.headless {
            FetchMode::Headless
        } else {
            FetchMode::Static
        },
        rules: extract_rules(&cli),
        workers: config.concurrency(),
        batch_size: config.probe_batch_size(),
    };

    let report = scan::scan(&controller, &cli.url, &options, |progress| {
        println!(
            "probed {}/{}  known total {}",
            progress.done,
            progress.total,
            human_bytes(Some(progress.known_bytes))
        );
    })
    .await
    .with_context(|| format!("scan of {} failed", cli.url))?;

    let items = report.items.items();
    print_items(items);
    if let Some(range) = selection::known_range_kb(items) {
        println!(
            "{} items, sizes {} to {}",
            items.len(),
            human_kb(range.min),
            human_kb(range.max)
        );
    }

    if cli.list_only {
        return Ok(ExitCode::SUCCESS);
    }

    let mut chosen_selection = Selection::new()
        .with_size_range(cli.min_kb, cli.max_kb)
        .with_sort(cli.sort);
    if !cli.kind.is_empty() {
        chosen_selection = chosen_selection.with_kinds(cli.kind.iter().copied());
    }
    let chosen: Vec<MediaItem> = chosen_selection.apply(items).into_iter().cloned().collect();
    if chosen.is_empty() {
        println!("nothing matches the selection");
        return Ok(ExitCode::SUCCESS);
    }
    println!(
        "selected {} items, {} known",
        chosen.len(),
        human_bytes(Some(selection::total_bytes(&chosen)))
    );

    let prefs_path = Preferences::default_path();
    let mut prefs = prefs_path
        .as_deref()
        .map(Preferences::load)
        .unwrap_or_default();
    let dest = prefs.resolve_download_dir(config.download_dir().map(|p| p.as_path()));

    if !cli.no_remember && prefs.last_download_dir.as_ref() != Some(&dest) {
        prefs.last_download_dir = Some(dest.clone());
        if let Some(path) = &prefs_path
            && let Err(e) = prefs.save(path)
        {
            warn!("could not remember download directory: {}", e);
        }
    }

    let outcomes =
        downloader::download_all(&chosen, &dest, report.session.clone(), config.concurrency())
            .await;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(file) => println!(
                "ok {} ({})",
                file.path.display(),
                human_bytes(Some(file.bytes_written))
            ),
            Err(e) => {
                failed += 1;
                println!("failed {}: {}", outcome.url, e);
            }
        }
    }

    if failed > 0 {
        println!("{failed} of {} downloads failed", outcomes.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
