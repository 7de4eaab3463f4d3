//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    aggregate::AggregateQueue,
    config::Config,
    geocoder::Geocoder,
    repository::{BootcampRepository, CourseRepository},
    seed::Seeder,
    surrealdb_backend::SurrealClient,
    uploads::FileStore,
};

/// Everything a request handler needs, assembled once at startup
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    db: SurrealClient,
    bootcamps: BootcampRepository,
    courses: CourseRepository,
    geocoder: Arc<dyn Geocoder>,
    files: Arc<dyn FileStore>,
    aggregates: AggregateQueue,
}

impl AppState {
    pub fn new(
        config: Config,
        db: SurrealClient,
        geocoder: Arc<dyn Geocoder>,
        files: Arc<dyn FileStore>,
        aggregates: AggregateQueue,
    ) -> Self {
        Self {
            config: Arc::new(config),
            bootcamps: BootcampRepository::new(db.clone()),
            courses: CourseRepository::new(db.clone()),
            db,
            geocoder,
            files,
            aggregates,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Raw client, for health checks
    pub fn db(&self) -> &SurrealClient {
        &self.db
    }

    pub fn bootcamps(&self) -> &BootcampRepository {
        &self.bootcamps
    }

    pub fn courses(&self) -> &CourseRepository {
        &self.courses
    }

    pub fn geocoder(&self) -> &dyn Geocoder {
        self.geocoder.as_ref()
    }

    pub fn files(&self) -> &dyn FileStore {
        self.files.as_ref()
    }

    /// Queue for `averageCost` recomputes
    pub fn aggregates(&self) -> &AggregateQueue {
        &self.aggregates
    }

    pub fn seeder(&self) -> Seeder {
        Seeder::new(self.bootcamps.clone(), self.courses.clone())
    }
}
