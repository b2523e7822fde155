//! ldo - Command-line client for a Discourse forum.

mod commands;
mod export;
mod output;
mod shell;
mod text;

use clap::{Parser, Subcommand};
use commands::Context;
use export::ExportFormat;
use forum_client::{TopPeriod, TopicFilter};
use forum_config_and_utils::{init_logging, Config, Credentials, Paths};
use std::path::PathBuf;
use tracing::debug;

/// ldo - Browse, search and reply on the forum from a terminal.
#[derive(Parser)]
#[command(name = "ldo")]
#[command(about = "Terminal client for linux.do and other Discourse forums")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List topics
    Topics {
        /// Listing to fetch (latest, hot, new, top, unread)
        #[arg(long, default_value = "latest")]
        filter: TopicFilter,
        /// Period for the top listing (daily, weekly, monthly, quarterly, yearly, all)
        #[arg(long)]
        period: Option<TopPeriod>,
        /// Maximum number of topics to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Read a topic
    Read {
        /// Topic ID
        topic: u64,
        /// Show a single floor
        #[arg(long, conflicts_with = "all")]
        floor: Option<u32>,
        /// Load every post
        #[arg(long)]
        all: bool,
    },

    /// Search posts
    Search {
        /// Search query
        query: String,
        /// Result page
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Reply to a topic
    Reply {
        /// Topic ID
        topic: u64,
        /// Floor to reply to
        #[arg(long)]
        to: Option<u32>,
        /// Reply text (read from stdin when omitted)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Like or unlike a post
    Like {
        /// Topic ID
        topic: u64,
        /// Floor number
        floor: u32,
    },

    /// Manage bookmarks
    Bookmarks {
        #[command(subcommand)]
        command: BookmarkCommands,
    },

    /// Open a topic in the browser
    Browser {
        /// Topic ID
        topic: u64,
    },

    /// Interactive shell (default)
    Shell,
}

#[derive(Subcommand)]
enum BookmarkCommands {
    /// List bookmarks
    List,
    /// Export bookmarks to a file
    Export {
        /// Document format (txt, html, md)
        #[arg(default_value = "md")]
        kind: ExportFormat,
        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Delete every bookmark
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn resolve_filter(filter: TopicFilter, period: Option<TopPeriod>) -> TopicFilter {
    match (filter, period) {
        (TopicFilter::Top(_), Some(period)) => TopicFilter::Top(period),
        (filter, _) => filter,
    }
}

async fn run(cli: Cli, ctx: Context) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Topics {
            filter,
            period,
            limit,
        } => commands::topics(&ctx, resolve_filter(filter, period), limit, &format).await,
        Commands::Read { topic, floor, all } => {
            commands::read(&ctx, topic, floor, all, &format).await
        }
        Commands::Search { query, page } => commands::search(&ctx, &query, page, &format).await,
        Commands::Reply { topic, to, message } => {
            commands::reply(&ctx, topic, to, message, &format).await
        }
        Commands::Like { topic, floor } => commands::like(&ctx, topic, floor, &format).await,
        Commands::Bookmarks { command } => match command {
            BookmarkCommands::List => commands::bookmarks_list(&ctx, &format).await,
            BookmarkCommands::Export { kind, out } => {
                commands::bookmarks_export(&ctx, kind, out, &format).await
            }
            BookmarkCommands::Clear { yes } => {
                commands::bookmarks_clear(&ctx, yes, &format).await
            }
        },
        Commands::Browser { topic } => commands::browser(&ctx, topic, &format).await,
        Commands::Shell => shell::run(&ctx).await,
    }
}

async fn connect(credentials: &Credentials) -> anyhow::Result<Context> {
    let paths = Paths::new()?;
    let config = Config::load(&paths)?;
    config.validate()?;
    Context::connect(config, paths, credentials).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging("ldo", &cli.log_level, false);

    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = match connect(&credentials).await {
        Ok(ctx) => ctx,
        Err(e) => {
            output::print_error(&format!("{:#}", e), &cli.format);
            std::process::exit(1);
        }
    };
    debug!(base_url = %ctx.client.base_url(), "Ready");

    let format = cli.format;
    if let Err(e) = run(cli, ctx).await {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }
}
