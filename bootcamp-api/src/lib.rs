//! # bootcamp-api
//!
//! REST API for a directory of coding bootcamps and the courses they offer.
//!
//! - List endpoints accept field filters (`averageCost[gte]=10000`,
//!   `careers[in]=Business`), `select`, `sort`, `page` and `limit`
//!   ([`query`]).
//! - A bootcamp's `averageCost` is derived from its courses' tuition and kept
//!   current by a background worker ([`aggregate`]).
//! - Radius search geocodes a postal code and matches bootcamps by
//!   great-circle distance ([`geo`], [`geocoder`]).
//! - Data lives in SurrealDB ([`repository`], [`surrealdb_backend`]).
//!
//! ```rust,ignore
//! let config = Config::load()?;
//! init_tracing(&config)?;
//! Application::build(config).await?.run().await
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod geo;
pub mod geocoder;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod query;
pub mod repository;
pub mod routes;
pub mod seed;
pub mod server;
pub mod state;
pub mod surrealdb_backend;
pub mod uploads;

use std::sync::Arc;

use axum::Router;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    aggregate::{spawn_worker, AverageCostMaintainer},
    config::Config,
    error::{Error, Result},
    repository::{BootcampRepository, CourseRepository},
    server::{shutdown_signal, Server},
    state::AppState,
    uploads::LocalFileStore,
};

/// A wired service: state, routes and the running aggregate worker
pub struct Application {
    state: AppState,
    router: Router,
    worker: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl Application {
    /// Connect to the store, start the aggregate worker and build the routes
    pub async fn build(config: Config) -> Result<Self> {
        let db = surrealdb_backend::connect(&config.database).await?;
        let geocoder = geocoder::from_config(&config.geocoder)?;
        let files = Arc::new(LocalFileStore::new(config.uploads.path.clone()));

        let shutdown = CancellationToken::new();
        let (aggregates, worker) = spawn_worker(
            AverageCostMaintainer::new(
                BootcampRepository::new(db.clone()),
                CourseRepository::new(db.clone()),
            ),
            shutdown.child_token(),
        );

        let state = AppState::new(config, db, geocoder, files, aggregates);
        let router = routes::router(state.clone());

        Ok(Self {
            state,
            router,
            worker,
            shutdown,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Routes with state attached, before the server middleware stack
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until a shutdown signal.
    ///
    /// If the aggregate worker dies the server is abandoned and an error is
    /// returned, so the process can exit non-zero.
    pub async fn run(self) -> Result<()> {
        let Self {
            state,
            router,
            mut worker,
            shutdown,
        } = self;

        let server = Server::new(state.config().clone());

        tokio::select! {
            served = server.serve_with_shutdown(router, shutdown_signal()) => {
                served?;
            }
            joined = &mut worker => {
                let reason = match joined {
                    Ok(()) => "exited".to_string(),
                    Err(e) => e.to_string(),
                };
                tracing::error!(%reason, "Aggregate worker ended unexpectedly");
                return Err(Error::Internal(format!("Aggregate worker ended: {reason}")));
            }
        }

        if let Err(e) = state.aggregates().flush().await {
            tracing::warn!(error = %e, "Pending recomputes were not drained");
        }
        shutdown.cancel();
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "Aggregate worker failed during shutdown");
        }

        Ok(())
    }

    /// Stop the aggregate worker without serving
    pub async fn shutdown(self) -> Result<()> {
        self.state.aggregates().flush().await?;
        self.shutdown.cancel();
        self.worker
            .await
            .map_err(|e| Error::Internal(format!("Aggregate worker failed: {e}")))
    }
}
