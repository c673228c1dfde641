use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};

use filegate::config::StorageBackendKind;
use filegate::db::SqlFileStore;
use filegate::storage::{GrantTtls, MemoryObjectStore, ObjectStore, S3ObjectStore};
use filegate::web::{AppState, WebServer};
use filegate::{Config, Database, FileService, GatewayError, TokenVerifier};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let config_path =
        std::env::var("FILEGATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = filegate::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        filegate::logging::init_console_only(&config.logging.level);
    }

    info!("filegate - authenticated file gateway");

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> filegate::Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path, config.database.max_connections).await?;

    let objects: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackendKind::S3 => {
            let store = S3ObjectStore::from_config(&config.storage)
                .map_err(|e| GatewayError::Config(format!("storage backend: {e}")))?;
            info!("Using S3 storage bucket {}", config.storage.bucket);
            Arc::new(store)
        }
        StorageBackendKind::Memory => {
            warn!("Using in-memory storage backend; signed URLs are not usable by clients");
            Arc::new(MemoryObjectStore::new(config.storage.bucket.clone()))
        }
    };

    let files = FileService::new(
        Arc::new(SqlFileStore::new(db.pool().clone())),
        objects,
        GrantTtls::from(&config.grants),
    );
    let verifier = TokenVerifier::new(
        &config.auth.jwt_secret,
        config.auth.audience.as_deref(),
        config.auth.leeway_secs,
    );

    let server = WebServer::new(
        &config.server,
        AppState::new(files, config.listing.default_limit),
        verifier,
    )?;
    info!("Server configured on {}", server.addr());

    server.run().await?;
    Ok(())
}
