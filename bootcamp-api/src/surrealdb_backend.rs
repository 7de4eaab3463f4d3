//! SurrealDB connection management and schema
//!
//! The engine is picked from the URL scheme:
//! - `ws://` / `wss://` - WebSocket connections
//! - `http://` / `https://` - HTTP connections
//! - `mem://` - In-memory database (tests, local runs)

use std::time::Duration;

use crate::{
    config::DatabaseConfig,
    error::{Error, Result},
    repository::{RepositoryError, RepositoryOperation},
};

/// SurrealDB client type alias using the `Any` engine for runtime protocol selection
pub type SurrealClient = surrealdb::Surreal<surrealdb::engine::any::Any>;

/// Tables, plus the unique indexes backing name/slug/title uniqueness
const SCHEMA: &str = "
    DEFINE TABLE IF NOT EXISTS bootcamp SCHEMALESS;
    DEFINE INDEX IF NOT EXISTS bootcamp_name ON TABLE bootcamp FIELDS name UNIQUE;
    DEFINE INDEX IF NOT EXISTS bootcamp_slug ON TABLE bootcamp FIELDS slug UNIQUE;
    DEFINE TABLE IF NOT EXISTS course SCHEMALESS;
    DEFINE INDEX IF NOT EXISTS course_title ON TABLE course FIELDS title UNIQUE;
    DEFINE INDEX IF NOT EXISTS course_bootcamp ON TABLE course FIELDS bootcamp;
";

/// Connect, retrying with exponential backoff, then make sure the schema exists
pub async fn connect(config: &DatabaseConfig) -> Result<SurrealClient> {
    let client = create_client_with_retries(config, config.max_retries).await?;
    define_schema(&client).await?;
    Ok(client)
}

/// Define tables and indexes; safe to run repeatedly
pub async fn define_schema(client: &SurrealClient) -> Result<()> {
    client
        .query(SCHEMA)
        .await
        .and_then(|response| response.check())
        .map_err(|e| RepositoryError::from_surreal(RepositoryOperation::Schema, e))?;

    tracing::debug!("SurrealDB schema defined");
    Ok(())
}

async fn create_client_with_retries(
    config: &DatabaseConfig,
    max_retries: u32,
) -> Result<SurrealClient> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_client(config).await {
            Ok(client) => {
                if attempt > 0 {
                    tracing::info!(
                        "SurrealDB connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        url = %sanitize_connection_url(&config.url),
                        namespace = %config.namespace,
                        database = %config.database,
                        "SurrealDB connected"
                    );
                }
                return Ok(client);
            }
            Err(e) => {
                attempt += 1;

                if attempt > max_retries {
                    tracing::error!(
                        "Failed to connect to SurrealDB after {} attempts: {}",
                        max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));

                tracing::warn!(
                    "SurrealDB connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn try_create_client(config: &DatabaseConfig) -> Result<SurrealClient> {
    let url_safe = sanitize_connection_url(&config.url);
    tracing::debug!("Connecting to SurrealDB: {}", url_safe);

    let client = surrealdb::engine::any::connect(&config.url)
        .await
        .map_err(|e| {
            Error::Internal(format!(
                "Failed to connect to SurrealDB at '{}' ({}): {}",
                url_safe,
                categorize_surrealdb_error(&e),
                e
            ))
        })?;

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        client
            .signin(surrealdb::opt::auth::Root { username, password })
            .await
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to authenticate with SurrealDB at '{}' ({}): {}",
                    url_safe,
                    categorize_surrealdb_error(&e),
                    e
                ))
            })?;
    }

    client
        .use_ns(&config.namespace)
        .use_db(&config.database)
        .await
        .map_err(|e| {
            Error::Internal(format!(
                "Failed to select namespace '{}' / database '{}' on '{}' ({}): {}",
                config.namespace,
                config.database,
                url_safe,
                categorize_surrealdb_error(&e),
                e
            ))
        })?;

    Ok(client)
}

/// Remove credentials from a connection URL before it is logged
pub fn sanitize_connection_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(scheme_end) = url.find("://") {
            let scheme = &url[..scheme_end + 3];
            let after_at = &url[at_pos..];
            return format!("{scheme}***{after_at}");
        }
    }
    url.to_string()
}

fn categorize_surrealdb_error(err: &surrealdb::Error) -> &'static str {
    let err_str = err.to_string().to_lowercase();

    if err_str.contains("auth") || err_str.contains("credentials") || err_str.contains("signin") {
        "authentication error"
    } else if err_str.contains("connect")
        || err_str.contains("network")
        || err_str.contains("dns")
        || err_str.contains("refused")
    {
        "network error"
    } else if err_str.contains("timeout") {
        "timeout"
    } else {
        "connection error"
    }
}
