use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use vibe_engagement::domain::value_objects::{PostId, UserId};
use vibe_engagement::shared::metrics;
use vibe_engagement::{init_logging, AppConfig, AppState};

#[derive(Parser)]
#[command(name = "vibe-engagement")]
#[command(about = "Like/unlike synchronization engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// User performing the actions
    #[arg(short, long, env = "VIBE_USER_ID")]
    user: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Flip the like state of a post
    Toggle { post_id: String },
    /// Like a post (no-op when already liked)
    Like { post_id: String },
    /// Remove a like (no-op when not liked)
    Unlike { post_id: String },
    /// Check whether the user has liked a post
    Check { post_id: String },
    /// Load every post the user has liked
    Fetch,
    /// Inspect or replay likes that never reached the server
    Pending {
        #[command(subcommand)]
        command: PendingCommands,
    },
    /// Replay pending likes periodically until Ctrl+C
    Watch,
}

#[derive(Subcommand)]
enum PendingCommands {
    List,
    Clear,
    Flush,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.json_logs);

    info!("Starting vibe-engagement v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::from_env();
    if matches!(cli.command, Commands::Watch) {
        config.sync.auto_flush = true;
    }
    let state = AppState::new(config).await?;
    let user_id = UserId::new(cli.user.as_str()).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Toggle { post_id } => {
            state.store.hydrate(user_id.as_str()).await?;
            state.store.toggle(&post_id, user_id.as_str()).await?;
            print_post(&state, &post_id).await?;
        }
        Commands::Like { post_id } => {
            state.store.hydrate(user_id.as_str()).await?;
            state.store.like(&post_id, user_id.as_str()).await?;
            print_post(&state, &post_id).await?;
        }
        Commands::Unlike { post_id } => {
            state.store.hydrate(user_id.as_str()).await?;
            state.store.unlike(&post_id, user_id.as_str()).await?;
            print_post(&state, &post_id).await?;
        }
        Commands::Check { post_id } => {
            let liked = state.store.check_liked(&post_id, user_id.as_str()).await?;
            print_json(&json!({
                "post_id": post_id,
                "liked": liked,
                "error": state.store.last_error().await,
            }))?;
        }
        Commands::Fetch => {
            state.store.fetch_all_liked_by_user(user_id.as_str()).await?;
            state.store.settle().await;
            print_json(&json!({
                "liked": state.store.liked_post_ids().await,
                "error": state.store.last_error().await,
            }))?;
        }
        Commands::Pending { command } => match command {
            PendingCommands::List => {
                let actions = state.store.pending_log().list().await?;
                print_json(&actions)?;
            }
            PendingCommands::Clear => {
                state.store.pending_log().clear().await?;
                info!("Pending like actions cleared");
            }
            PendingCommands::Flush => {
                let report = state.replayer.flush(user_id.as_str()).await?;
                print_json(&report)?;
            }
        },
        Commands::Watch => {
            let handle = state.start_auto_flush(user_id);
            info!("Watching pending likes. Press Ctrl+C to stop.");
            tokio::signal::ctrl_c().await?;
            if let Some(handle) = handle {
                handle.abort();
            }
            state.store.settle().await;
            print_json(&metrics::snapshot())?;
        }
    }

    Ok(())
}

/// 照合が終わるのを待ってから状態を表示する
async fn print_post(state: &AppState, post_id: &str) -> Result<()> {
    state.store.settle().await;
    let post_id = PostId::new(post_id).map_err(anyhow::Error::msg)?;
    print_json(&json!({
        "post_id": post_id,
        "liked": state.store.is_liked_locally(&post_id).await,
        "stats": state.store.stats_for(&post_id).await,
        "state": state.store.toggle_state(&post_id).await,
        "error": state.store.last_error().await,
    }))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
