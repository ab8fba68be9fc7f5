use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

use dorasong::cli::{Cli, Commands};
use dorasong::core::utils::bytes_to_mib;
use dorasong::core::{config, init_logger, log_startup_configuration, RateLimiter};
use dorasong::download::{FetchPipeline, PipelineConfig, YtDlpSource};
use dorasong::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point
///
/// Parses CLI arguments and dispatches to the selected subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, bot creation, pipeline setup).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;
    log_startup_configuration();

    match cli.command {
        Some(Commands::Run) => run_bot().await,
        Some(Commands::Fetch { query, max_size_mb }) => run_cli_fetch(query, max_size_mb).await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot().await
        }
    }
}

fn build_pipeline() -> Result<Arc<FetchPipeline>> {
    let source = Arc::new(YtDlpSource::new());
    let pipeline = FetchPipeline::new(source, PipelineConfig::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to prepare download folder: {}", e))?;
    Ok(Arc::new(pipeline))
}

/// Runs the pipeline once and prints what it produced.
async fn run_cli_fetch(query: String, max_size_mb: Option<u64>) -> Result<()> {
    let max_size_bytes = max_size_mb
        .map(config::mib_to_bytes)
        .unwrap_or_else(config::max_file_size_bytes);

    let pipeline = build_pipeline()?;
    let song = pipeline.fetch(&query, max_size_bytes).await?;

    println!("Path:      {}", song.audio_path.display());
    println!("Title:     {}", song.title);
    println!("Artist:    {}", song.artist);
    match &song.thumbnail_path {
        Some(thumb) => println!("Thumbnail: {}", thumb.display()),
        None => println!("Thumbnail: none"),
    }
    println!("Size:      {:.1} MB", bytes_to_mib(song.size_bytes));

    Ok(())
}

async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");

    let bot = create_bot()?;

    let bot_info = bot
        .get_me()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to Bot API: {}", e))?;
    let bot_username = bot_info.username.clone();
    log::info!("Bot username: {:?}, Bot ID: {}", bot_username, bot_info.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let rate_limiter = Arc::new(RateLimiter::new());
    // Periodically evict requesters with an empty window
    let _cleanup = Arc::clone(&rate_limiter).spawn_cleanup_task(config::rate_limit::sweep_interval());

    let pipeline = build_pipeline()?;
    let handler_deps = HandlerDeps::new(rate_limiter, pipeline, bot_username, config::max_file_size_bytes());
    let handler = schema(handler_deps);

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
