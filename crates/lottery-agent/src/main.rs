//! lottery-agent: watch the forum and reply to lottery topics.
//!
//! Credentials come from `LINUXDO_USERNAME` / `LINUXDO_PASSWORD`. Runs in
//! the foreground until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use forum_client::{ClientConfig, ForumApi, ForumClient};
use forum_config_and_utils::{init_logging, Config, Credentials, Paths};
use lottery_agent::{AgentConfig, LotteryAgent, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "lottery-agent")]
#[command(about = "Auto-reply to lottery topics on a Discourse forum", long_about = None)]
#[command(version)]
struct Args {
    /// Seconds between scan cycles
    #[arg(long, env = "LOTTERY_INTERVAL_SECS", default_value_t = 300)]
    interval_secs: u64,

    /// Lower bound of the random pause before each reply, in seconds
    #[arg(long, default_value_t = 10)]
    min_delay_secs: u64,

    /// Upper bound of the random pause before each reply, in seconds
    #[arg(long, default_value_t = 30)]
    max_delay_secs: u64,

    /// Extra keywords, in addition to the built-in set
    #[arg(long = "keyword")]
    keywords: Vec<String>,

    /// Only scan the latest list, never the unread list
    #[arg(long)]
    latest_only: bool,

    /// Skip merging the server's reply history at startup
    #[arg(long)]
    no_history: bool,

    /// Log level (overrides config)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn agent_config(&self) -> AgentConfig {
        let mut config = AgentConfig {
            check_interval: Duration::from_secs(self.interval_secs),
            reply_delay_min: Duration::from_secs(self.min_delay_secs),
            reply_delay_max: Duration::from_secs(self.max_delay_secs),
            prefer_unread: !self.latest_only,
            reconcile_history: !self.no_history,
            ..AgentConfig::default()
        };
        for keyword in &self.keywords {
            if !config.keywords.contains(keyword) {
                config.keywords.push(keyword.clone());
            }
        }
        config
    }
}

async fn run(args: Args, credentials: Credentials) -> Result<()> {
    let paths = Paths::new()?;
    paths.ensure_dirs()?;
    let config = Config::load(&paths)?;

    let level = args.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging("lottery-agent", &level, true);

    let agent_config = args.agent_config();
    let client_config = ClientConfig::from_config(&config, &paths)?;
    let client = ForumClient::connect(client_config, &credentials)
        .await
        .context("Could not establish a forum session")?;
    info!(username = %client.username(), base_url = %client.base_url(), "Session ready");

    let api: Arc<dyn ForumApi> = Arc::new(client);
    let state = Arc::new(StateStore::open(paths.agent_state_file()));
    let agent = LotteryAgent::new(api, state, agent_config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!(error = %e, "Could not listen for Ctrl-C"),
        }
    });

    let report = agent.run(shutdown_rx).await?;
    info!(
        replied = report.replied,
        failed = report.failed,
        rate_limited = report.rate_limited,
        recorded = agent.state().replied_count(),
        "Lottery agent stopped"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Checked before anything else touches disk or network.
    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args, credentials).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
