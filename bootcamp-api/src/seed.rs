//! Bundled sample data
//!
//! Used by the reset endpoint and by the `bootcamp` CLI.

use serde::de::DeserializeOwned;
use tracing::info;

use crate::{
    aggregate::AverageCostMaintainer,
    error::{Error, Result},
    models::{Bootcamp, Course},
    repository::{BootcampRepository, CourseRepository, Repository},
};

const BOOTCAMPS_JSON: &str = include_str!("../data/bootcamps.json");
const COURSES_JSON: &str = include_str!("../data/courses.json");

/// Sample bootcamps with fixed keys
pub fn sample_bootcamps() -> Result<Vec<Bootcamp>> {
    parse("bootcamps", BOOTCAMPS_JSON)
}

/// Sample courses, each pointing at a sample bootcamp
pub fn sample_courses() -> Result<Vec<Course>> {
    parse("courses", COURSES_JSON)
}

fn parse<T: DeserializeOwned>(what: &str, raw: &str) -> Result<Vec<T>> {
    serde_json::from_str(raw)
        .map_err(|e| Error::Internal(format!("Bundled sample {what} are malformed: {e}")))
}

/// Record counts touched by a seed operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub bootcamps: u64,
    pub courses: u64,
}

/// Loads and wipes the sample data set
#[derive(Clone)]
pub struct Seeder {
    bootcamps: BootcampRepository,
    courses: CourseRepository,
    maintainer: AverageCostMaintainer,
}

impl Seeder {
    pub fn new(bootcamps: BootcampRepository, courses: CourseRepository) -> Self {
        Self {
            maintainer: AverageCostMaintainer::new(bootcamps.clone(), courses.clone()),
            bootcamps,
            courses,
        }
    }

    /// Insert the samples and compute every bootcamp's average cost before returning
    pub async fn import(&self) -> Result<SeedReport> {
        let bootcamps = sample_bootcamps()?;
        let courses = sample_courses()?;
        let report = SeedReport {
            bootcamps: bootcamps.len() as u64,
            courses: courses.len() as u64,
        };

        let ids: Vec<String> = bootcamps.iter().map(|b| b.id.clone()).collect();
        for bootcamp in bootcamps {
            self.bootcamps.create(bootcamp).await?;
        }
        for course in courses {
            self.courses.create(course).await?;
        }
        for id in &ids {
            self.maintainer.recompute_average_cost(id).await?;
        }

        info!(bootcamps = report.bootcamps, courses = report.courses, "Sample data imported");
        Ok(report)
    }

    /// Remove every bootcamp and course
    pub async fn destroy(&self) -> Result<SeedReport> {
        let report = SeedReport {
            courses: self.courses.delete_all().await?,
            bootcamps: self.bootcamps.delete_all().await?,
        };

        info!(bootcamps = report.bootcamps, courses = report.courses, "Data destroyed");
        Ok(report)
    }

    /// Destroy, then import
    pub async fn reset(&self) -> Result<SeedReport> {
        self.destroy().await?;
        self.import().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DatabaseConfig, repository::Filter, surrealdb_backend};
    use std::collections::HashSet;

    #[test]
    fn test_samples_parse_and_reference_each_other() {
        let bootcamps = sample_bootcamps().unwrap();
        let courses = sample_courses().unwrap();
        assert_eq!(bootcamps.len(), 4);
        assert_eq!(courses.len(), 9);

        let ids: HashSet<&str> = bootcamps.iter().map(|b| b.id.as_str()).collect();
        assert!(courses.iter().all(|c| ids.contains(c.bootcamp.as_str())));

        let titles: HashSet<&str> = courses.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles.len(), courses.len());
    }

    #[tokio::test]
    async fn test_reset_is_repeatable() {
        let db = surrealdb_backend::connect(&DatabaseConfig::default())
            .await
            .unwrap();
        let bootcamps = BootcampRepository::new(db.clone());
        let seeder = Seeder::new(bootcamps.clone(), CourseRepository::new(db));

        seeder.reset().await.unwrap();
        let report = seeder.reset().await.unwrap();
        assert_eq!(report, SeedReport { bootcamps: 4, courses: 9 });
        assert_eq!(bootcamps.count(&Filter::new()).await.unwrap(), 4);

        let devcentral = bootcamps
            .find_by_id("5d725a1b7b292f5f8ceff788")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(devcentral.average_cost, Some(6340.0));
    }

    #[tokio::test]
    async fn test_destroy_reports_removed_counts() {
        let db = surrealdb_backend::connect(&DatabaseConfig::default())
            .await
            .unwrap();
        let seeder = Seeder::new(BootcampRepository::new(db.clone()), CourseRepository::new(db));

        seeder.import().await.unwrap();
        assert_eq!(
            seeder.destroy().await.unwrap(),
            SeedReport { bootcamps: 4, courses: 9 }
        );
        assert_eq!(seeder.destroy().await.unwrap(), SeedReport::default());
    }
}
