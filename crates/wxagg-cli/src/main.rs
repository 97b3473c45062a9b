mod ingest;
mod login;
mod schedule;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::schedule::ScheduleCommands;

#[derive(Debug, Parser)]
#[command(name = "wxagg")]
#[command(about = "WeChat and web article aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scheduled run; intended to be invoked by cron every few minutes
    Run,
    /// Fetch all enabled accounts now, ignoring the schedule
    Fetch,
    /// Fetch one web page and store it as a manually added article
    AddUrl {
        /// Absolute http(s) URL of the article
        url: String,
        /// Cookie header to send with the request
        #[arg(long)]
        cookie: Option<String>,
    },
    /// List the most recently published stored articles
    Recent {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Show or change the recurrence rule
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    /// Run the login helper and save fresh WeChat credentials
    Login,
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

fn init_tracing(fallback_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = wxagg_core::load_app_config().context("failed to load configuration")?;
    init_tracing(&config.log_level);
    tracing::debug!(?config, "configuration loaded");

    let Some(command) = cli.command else {
        println!("wxagg: no command given; see `wxagg --help`");
        return Ok(());
    };

    match command {
        Commands::Schedule { command } => schedule::run_schedule_command(&config, command)?,
        Commands::Login => login::run_login(&config).await?,
        Commands::Run => {
            let pool = connect(&config).await?;
            ingest::run_cron(&pool, &config).await?;
        }
        Commands::Fetch => {
            let pool = connect(&config).await?;
            ingest::run_fetch_now(&pool, &config).await?;
        }
        Commands::AddUrl { url, cookie } => {
            let pool = connect(&config).await?;
            ingest::run_add_url(&pool, &config, &url, cookie.as_deref()).await?;
        }
        Commands::Recent { limit } => {
            let pool = connect(&config).await?;
            ingest::run_recent(&pool, limit).await?;
        }
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    wxagg_db::ping(&pool).await.context("database ping failed")?;
                    println!("database: ok");
                }
                DbCommands::Migrate => {
                    let applied = wxagg_db::run_migrations(&pool)
                        .await
                        .context("failed to run migrations")?;
                    println!("migrations: {applied} applied");
                }
            }
        }
    }

    Ok(())
}

async fn connect(config: &wxagg_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    wxagg_db::connect(config)
        .await
        .context("failed to connect to database")
}
