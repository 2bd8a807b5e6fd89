//! Lansiaku CLI - run the registry server or seed development data
//!
//! ```bash
//! lansiaku serve               # Start the HTTP server
//! lansiaku seed --count 200    # Insert fake residents for development
//! ```
//!
//! Configuration comes from the environment (`DATABASE_URL`, `BIND`,
//! `JWT_SECRET`, `GEOJSON_PATH`, `TEMPLATE_PATH`); a `.env` file is
//! honored.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lansiaku::api::AppState;
use lansiaku::{db, seed, Config};

#[derive(Parser)]
#[command(name = "lansiaku")]
#[command(about = "Elderly resident registry backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address, overriding BIND
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Seed fake residents and the default admin account
    Seed {
        /// Number of residents to generate
        #[arg(short, long, default_value = "100")]
        count: usize,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { bind } => cmd_serve(bind).await,
        Commands::Seed { count } => cmd_seed(count).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn cmd_serve(bind: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::from_env()?;
    if let Some(bind) = bind {
        config.bind = bind;
    }

    let pool = db::connect(&config.database_url).await?;
    let state = AppState::new(pool, config);
    lansiaku::server::start_server(state).await
}

async fn cmd_seed(count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let pool = db::connect(&config.database_url).await?;
    seed::seed(&pool, count).await?;
    eprintln!("Seeded {count} residents");
    Ok(())
}
