use anyhow::Result;
use axum::Router;
use spotbook::payments::{CheckoutGateway, MockCheckout, StripeCheckout};
use spotbook::{build_state, config, errors, routes};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{fs, io::ErrorKind, path::Path, str::FromStr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting spotbook with config: {:?}", cfg);
    errors::set_expose_detail(!cfg.production);

    // --- Initialize SQLite connection ---
    let db_url = &cfg.database_url;
    tracing::debug!("Connecting using URL => {}", db_url);

    // SQLite wants the parent directory to exist before it can create the
    // database file
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    let connect_opts = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
    let db: Arc<sqlx::Pool<sqlx::Sqlite>> = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_opts)
            .await?,
    );

    // --- Handle migration mode ---
    if migrate {
        run_migrations(&db).await?;
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Pick the checkout gateway ---
    let checkout: Arc<dyn CheckoutGateway> = match cfg.stripe_secret_key.as_deref() {
        Some(key) => StripeCheckout::shared(key),
        None => {
            tracing::warn!(
                "No Stripe secret key configured; artist registration will use the mock checkout gateway"
            );
            MockCheckout::shared()
        }
    };

    // --- Build router ---
    let state = build_state(db, checkout, &cfg.jwt_secret);
    let app: Router = routes::routes::routes().with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run SQLite migrations manually from the SQL files in `migrations/`,
/// lowest version first.
async fn run_migrations(db: &Arc<sqlx::Pool<sqlx::Sqlite>>) -> Result<()> {
    let dir = "migrations";
    if !Path::new(dir).exists() {
        anyhow::bail!("Migration directory not found: {}", dir);
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    paths.sort();

    for path in paths {
        let sql = fs::read_to_string(&path)?;
        let statements = sql
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        tracing::info!(
            "Running {} migration statements from {}...",
            statements.len(),
            path.display()
        );

        for stmt in statements {
            tracing::debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&**db).await?;
        }
    }

    Ok(())
}
