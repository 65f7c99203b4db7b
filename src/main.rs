use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pokedex_browser::{
    catalog::{BrowseSession, LoadOutcome},
    color::{ColorExtractor, SpriteLoader},
    config::Config,
    models::Rgb,
    sources::PokeApiSource,
    utils::StandardHttpClient,
};

#[derive(Parser)]
#[command(name = "pokedex-browser")]
#[command(version)]
#[command(about = "Page through the Pokedex, search it, and resolve sprite colors")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (defaults to $CONFIG_FILE, then pokedex.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Number of pages to load
    #[arg(short = 'n', long, default_value_t = 1)]
    pages: u32,

    /// Records per page (overrides config file)
    #[arg(long, value_name = "N")]
    page_size: Option<u32>,

    /// Filter the loaded entries by name or exact number
    #[arg(short, long, value_name = "QUERY")]
    search: Option<String>,

    /// Resolve the dominant sprite color of every visible entry
    #[arg(long)]
    colors: bool,

    /// Show the detail record for one entry
    #[arg(short, long, value_name = "NAME")]
    detail: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("pokedex_browser={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pokedex browser v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    if let Some(page_size) = cli.page_size {
        config.catalog.page_size = page_size;
    }
    config.validate()?;

    let source = Arc::new(PokeApiSource::new(&config.catalog)?);
    let session = BrowseSession::new(source, &config);

    for _ in 0..cli.pages {
        match session.request_next().await {
            Ok(LoadOutcome::EndReached { key }) => {
                info!("Catalog exhausted at page {}", key);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Page load failed, retrying once: {}", e);
                session.retry().await?;
            }
        }
    }

    let state = session.state().await;
    info!(
        "Loaded {} entries over {} pages ({} malformed records skipped)",
        state.len, state.pages_loaded, state.malformed_skipped
    );

    let visible = match &cli.search {
        Some(query) => session.search(query).await,
        None => session.visible().await,
    };

    let colors = if cli.colors {
        let cancel = CancellationToken::new();
        let ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling color extraction");
                ctrl_c.cancel();
            }
        });

        let extractor = ColorExtractor::new(config.color.max_concurrent_extractions);
        let loader = SpriteLoader::new(StandardHttpClient::new(
            config.catalog.connect_timeout,
            config.catalog.request_timeout,
        )?);

        join_all(visible.iter().map(|entry| {
            let (extractor, loader, cancel) = (&extractor, &loader, &cancel);
            async move {
                match loader.dominant_color(extractor, entry, cancel).await {
                    Ok(color) => Some(color),
                    Err(e) => {
                        warn!("No color for {}: {}", entry.name, e);
                        None
                    }
                }
            }
        }))
        .await
    } else {
        vec![None; visible.len()]
    };

    for (entry, color) in visible.iter().zip(colors) {
        match color {
            Some(color) => println!("#{:04} {:<16} {}", entry.numeric_id, entry.name, color),
            None if cli.colors => {
                println!("#{:04} {:<16} {}", entry.numeric_id, entry.name, Rgb::DEFAULT)
            }
            None => println!("#{:04} {}", entry.numeric_id, entry.name),
        }
    }

    if let Some(name) = &cli.detail {
        let detail = session.detail(name).await?;
        println!();
        println!("{} (#{})", detail.name, detail.id);
        println!("  types:  {}", detail.types.join(", "));
        println!("  height: {:.1} m", detail.height as f32 / 10.0);
        println!("  weight: {:.1} kg", detail.weight as f32 / 10.0);
        for (stat, value) in &detail.stats {
            println!("  {:<16} {}", stat, value);
        }
    }

    Ok(())
}
