use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use balance_core::{compute_category_balance, generate_next_cycle_tasks, Answers, QuestionCatalog};
use family_balance::api::{self, middleware::SecurityConfig};
use family_balance::config::AppConfig;
use family_balance::models::PlanRequest;

#[derive(Parser)]
#[command(name = "fbal")]
#[command(about = "Track how two parents share household work and plan weekly rebalancing tasks")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Score a JSON answers file and print category balances
    Score {
        /// JSON object of answer key to party label
        #[arg(short, long)]
        answers: PathBuf,

        /// Question catalog to use instead of the configured one
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
    /// Generate tasks for a JSON plan request and print the plan
    Plan {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the effective configuration
    Config {
        /// Rewrite the user config file with defaults filled in
        #[arg(long)]
        write: bool,
    },
}

/// Initialize tracing. Logs go to stderr so JSON output on stdout stays clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "family_balance=debug,balance_core=debug,tower_http=debug".into()
    }));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(config: AppConfig, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting family balance server on port {}", port);

    let db = config.open_database()?;
    let security = SecurityConfig::from_env();

    if let Some(limiter) = security.rate_limiter.clone() {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.window());
            loop {
                interval.tick().await;
                limiter.cleanup();
            }
        });
    }

    let app = api::create_router_with_security(db, security);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Family balance server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::load();

    match cli.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(config.port);
            serve(config, port).await?;
        }
        Some(Commands::Score { answers, catalog }) => {
            let answers: Answers = read_json(&answers)?;
            let catalog = match catalog {
                Some(path) => QuestionCatalog::from_json(&std::fs::read_to_string(&path)?)
                    .with_context(|| format!("Invalid catalog {}", path.display()))?,
                None => config.load_catalog()?,
            };
            let balances = compute_category_balance(&answers, &catalog);
            println!("{}", serde_json::to_string_pretty(&balances)?);
        }
        Some(Commands::Plan { input }) => {
            let request: PlanRequest = read_json(&input)?;
            let catalog = config.load_catalog()?;
            let plan = generate_next_cycle_tasks(&request.cycle_input(&catalog), &config.generator);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Some(Commands::Config { write }) => {
            if write {
                let path = AppConfig::write_user_file()?;
                tracing::info!("Wrote {}", path.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        None => {
            let port = config.port;
            serve(config, port).await?;
        }
    }

    Ok(())
}
