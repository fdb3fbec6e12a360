use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub stripe_secret_key: Option<String>,
    pub production: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Booking marketplace API")]
pub struct Args {
    /// Host to bind to (overrides SPOTBOOK_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides SPOTBOOK_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides SPOTBOOK_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// JWT signing secret (overrides SPOTBOOK_JWT_SECRET)
    #[arg(long)]
    pub jwt_secret: Option<String>,

    /// Stripe secret key (overrides SPOTBOOK_STRIPE_SECRET_KEY); without
    /// one, artist registration runs against the mock checkout gateway
    #[arg(long)]
    pub stripe_secret_key: Option<String>,

    /// Treat the deployment as production (hides error detail in responses,
    /// also SPOTBOOK_PRODUCTION=1)
    #[arg(long)]
    pub production: bool,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("SPOTBOOK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("SPOTBOOK_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing SPOTBOOK_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading SPOTBOOK_PORT"),
        };
        let env_db = env::var("SPOTBOOK_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/spotbook.db".into());
        let env_jwt =
            env::var("SPOTBOOK_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
        let env_stripe = env::var("SPOTBOOK_STRIPE_SECRET_KEY").ok();
        let env_production = matches!(
            env::var("SPOTBOOK_PRODUCTION").ok().as_deref(),
            Some("1") | Some("true") | Some("yes")
        );

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            jwt_secret: args.jwt_secret.unwrap_or(env_jwt),
            stripe_secret_key: args.stripe_secret_key.or(env_stripe),
            production: args.production || env_production,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
