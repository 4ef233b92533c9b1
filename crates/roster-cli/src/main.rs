//! Roster CLI - serve the team roster API and run maintenance tasks

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_api::ApiServer;
use roster_cli::commands;
use roster_cli::config::{Overrides, RosterConfig};
use roster_core::{NewOperator, DEFAULT_SAMPLE_COUNT};

/// Team roster service
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(about = "Register people and owners, build teams, manage memberships", long_about = None)]
#[command(version = env!("GIT_TAG"))]
#[command(long_version = concat!(env!("GIT_TAG"), "\nCommit: ", env!("GIT_HASH"), "\nBuilt: ", env!("BUILD_TIME")))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file
    #[arg(long, env = "ROSTER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Database URL (overrides the config file)
    #[arg(long, env = "ROSTER_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply migrations, then serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "ROSTER_BIND")]
        bind: Option<SocketAddr>,
        /// Secret used to sign operator sessions
        #[arg(long, env = "ROSTER_JWT_SECRET", hide_env_values = true)]
        jwt_secret: Option<String>,
    },
    /// Apply database migrations
    Migrate,
    /// Delete all people, teams and memberships (owners and operators are kept)
    ClearAllData,
    /// Fill SR No 1..=COUNT with generated people, skipping existing serials
    GenerateSample {
        #[arg(long, default_value_t = DEFAULT_SAMPLE_COUNT)]
        count: usize,
    },
    /// Bulk import people from a text file (`entry, serial, name, mobile` per line)
    Import {
        file: PathBuf,
    },
    /// Create a portal operator account
    CreateOperator {
        #[arg(long)]
        username: String,
        #[arg(long, env = "ROSTER_OPERATOR_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let (bind_addr, jwt_secret) = match &cli.command {
        Commands::Serve { bind, jwt_secret } => (*bind, jwt_secret.clone()),
        _ => (None, None),
    };
    let config = RosterConfig::resolve(
        cli.config.as_deref(),
        Overrides {
            database_url: cli.database_url.clone(),
            bind_addr,
            jwt_secret,
        },
    )?;

    match cli.command {
        Commands::Serve { .. } => handle_serve(config).await,
        Commands::Migrate => {
            commands::open_roster(&config.database_url).await?;
            println!("✓ Migrations applied");
            Ok(())
        }
        Commands::ClearAllData => handle_clear_all_data(&config).await,
        Commands::GenerateSample { count } => {
            let roster = commands::open_roster(&config.database_url).await?;
            println!("{}", commands::generate_sample(&roster, count).await?);
            Ok(())
        }
        Commands::Import { file } => {
            let roster = commands::open_roster(&config.database_url).await?;
            println!("{}", commands::import_file(&roster, &file).await?);
            Ok(())
        }
        Commands::CreateOperator {
            username,
            password,
            full_name,
            email,
        } => {
            let roster = commands::open_roster(&config.database_url).await?;
            let output = commands::create_operator(
                &roster,
                NewOperator {
                    username,
                    password,
                    full_name,
                    email,
                },
            )
            .await?;
            println!("{}", output);
            Ok(())
        }
    }
}

async fn handle_serve(config: RosterConfig) -> Result<()> {
    let api_config = config.api_config()?;

    let roster = commands::open_roster(&config.database_url).await?;
    let operators = roster
        .operators()
        .count()
        .await
        .context("Failed to count operator accounts")?;
    if operators == 0 {
        info!("No operator accounts yet; create one with `roster create-operator`");
    }

    ApiServer::new(api_config, roster.db().clone()).start().await
}

async fn handle_clear_all_data(config: &RosterConfig) -> Result<()> {
    let result = match commands::open_roster(&config.database_url).await {
        Ok(roster) => commands::clear_all_data(&roster).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Error clearing data: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to initialize logging filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
