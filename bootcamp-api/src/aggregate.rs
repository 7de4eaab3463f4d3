//! Derived `averageCost` maintenance
//!
//! Course writes never touch their parent directly. They schedule a
//! recompute on [`AggregateQueue`]; one background worker drains the queue in
//! order and writes the result through [`AverageCostMaintainer`].
//!
//! ```rust,ignore
//! let token = CancellationToken::new();
//! let (queue, worker) = spawn_worker(maintainer, token.clone());
//!
//! queue.schedule(course.bootcamp.clone());
//! queue.flush().await?; // wait until everything above has been applied
//!
//! token.cancel();
//! worker.await?;
//! ```

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    error::{Error, Result},
    repository::{BootcampRepository, CourseRepository},
};

/// Round a mean tuition up to the next multiple of ten
pub fn round_up_to_ten(mean: f64) -> f64 {
    (mean / 10.0).ceil() * 10.0
}

/// Recomputes one bootcamp's average course tuition
#[derive(Clone)]
pub struct AverageCostMaintainer {
    bootcamps: BootcampRepository,
    courses: CourseRepository,
}

impl AverageCostMaintainer {
    pub fn new(bootcamps: BootcampRepository, courses: CourseRepository) -> Self {
        Self { bootcamps, courses }
    }

    /// Write the rounded mean tuition to the bootcamp.
    ///
    /// A bootcamp with no courses keeps its previous `averageCost`. Returns
    /// the value written, if any.
    pub async fn recompute_average_cost(&self, bootcamp_id: &str) -> Result<Option<f64>> {
        let Some(stats) = self.courses.tuition_stats(bootcamp_id).await? else {
            debug!(bootcamp_id, "No courses left; averageCost unchanged");
            return Ok(None);
        };

        let average_cost = round_up_to_ten(stats.average);
        self.bootcamps
            .set_average_cost(bootcamp_id, average_cost)
            .await?;

        debug!(
            bootcamp_id,
            courses = stats.courses,
            mean = stats.average,
            average_cost,
            "averageCost recomputed"
        );
        Ok(Some(average_cost))
    }
}

#[derive(Debug)]
enum AggregateCommand {
    Recompute(String),
    Flush(oneshot::Sender<()>),
}

/// Sender side of the recompute queue
#[derive(Clone, Debug)]
pub struct AggregateQueue {
    tx: mpsc::UnboundedSender<AggregateCommand>,
}

impl AggregateQueue {
    /// Queue a recompute without waiting for it
    pub fn schedule(&self, bootcamp_id: impl Into<String>) {
        let bootcamp_id = bootcamp_id.into();
        if self
            .tx
            .send(AggregateCommand::Recompute(bootcamp_id.clone()))
            .is_err()
        {
            warn!(bootcamp_id, "Aggregate worker stopped; recompute dropped");
        }
    }

    /// Resolve once every previously scheduled recompute has run
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(AggregateCommand::Flush(ack))
            .map_err(|_| Error::Internal("Aggregate worker is not running".into()))?;
        done.await
            .map_err(|_| Error::Internal("Aggregate worker stopped before flushing".into()))
    }
}

/// Start the single worker that applies recomputes in arrival order
pub fn spawn_worker(
    maintainer: AverageCostMaintainer,
    shutdown: CancellationToken,
) -> (AggregateQueue, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_worker(maintainer, rx, shutdown));
    (AggregateQueue { tx }, handle)
}

async fn run_worker(
    maintainer: AverageCostMaintainer,
    mut rx: mpsc::UnboundedReceiver<AggregateCommand>,
    shutdown: CancellationToken,
) {
    info!("Aggregate worker started");

    loop {
        let command = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            command = rx.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        match command {
            AggregateCommand::Recompute(bootcamp_id) => {
                if let Err(e) = maintainer.recompute_average_cost(&bootcamp_id).await {
                    error!(bootcamp_id, error = %e, "averageCost recompute failed");
                }
            }
            AggregateCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    info!("Aggregate worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DatabaseConfig,
        models::{Bootcamp, Course, Location, SkillLevel},
        repository::Repository,
        surrealdb_backend,
    };
    use chrono::Utc;

    #[test]
    fn test_round_up_to_ten() {
        assert_eq!(round_up_to_ten(2000.0), 2000.0);
        assert_eq!(round_up_to_ten(6333.33), 6340.0);
        assert_eq!(round_up_to_ten(10500.0), 10500.0);
        assert_eq!(round_up_to_ten(10501.0), 10510.0);
        assert_eq!(round_up_to_ten(0.0), 0.0);
    }

    async fn repositories() -> (BootcampRepository, CourseRepository) {
        let db = surrealdb_backend::connect(&DatabaseConfig::default())
            .await
            .unwrap();
        (
            BootcampRepository::new(db.clone()),
            CourseRepository::new(db),
        )
    }

    fn bootcamp(id: &str) -> Bootcamp {
        Bootcamp {
            id: id.into(),
            name: format!("Bootcamp {id}"),
            slug: format!("bootcamp-{id}"),
            description: "Test bootcamp".into(),
            website: None,
            phone: None,
            email: None,
            address: "233 Bay State Rd Boston MA 02215".into(),
            location: Some(Location::point(-71.10216, 42.350846)),
            careers: vec!["Web Development".into()],
            average_rating: None,
            average_cost: None,
            photo: "no-photo.jpg".into(),
            housing: false,
            job_assistance: false,
            job_guarantee: false,
            accept_gi: false,
            created_at: Utc::now(),
        }
    }

    fn course(id: &str, bootcamp: &str, tuition: f64) -> Course {
        Course {
            id: id.into(),
            title: format!("Course {id}"),
            description: "Test course".into(),
            weeks: 8,
            tuition,
            minimum_skill: SkillLevel::Beginner,
            scholarship_available: false,
            created_at: Utc::now(),
            bootcamp: bootcamp.into(),
        }
    }

    #[tokio::test]
    async fn test_recompute_writes_rounded_mean() {
        let (bootcamps, courses) = repositories().await;
        bootcamps.create(bootcamp("b1")).await.unwrap();
        for (i, tuition) in [1000.0, 2000.0, 3000.0].into_iter().enumerate() {
            courses.create(course(&format!("c{i}"), "b1", tuition)).await.unwrap();
        }

        let maintainer = AverageCostMaintainer::new(bootcamps.clone(), courses);
        assert_eq!(maintainer.recompute_average_cost("b1").await.unwrap(), Some(2000.0));

        let stored = bootcamps.find_by_id("b1").await.unwrap().unwrap();
        assert_eq!(stored.average_cost, Some(2000.0));
    }

    #[tokio::test]
    async fn test_no_courses_skips_write() {
        let (bootcamps, courses) = repositories().await;
        let mut existing = bootcamp("b1");
        existing.average_cost = Some(7000.0);
        bootcamps.create(existing).await.unwrap();

        let maintainer = AverageCostMaintainer::new(bootcamps.clone(), courses);
        assert_eq!(maintainer.recompute_average_cost("b1").await.unwrap(), None);

        let stored = bootcamps.find_by_id("b1").await.unwrap().unwrap();
        assert_eq!(stored.average_cost, Some(7000.0));
    }

    #[tokio::test]
    async fn test_worker_applies_in_order_and_flushes() {
        let (bootcamps, courses) = repositories().await;
        bootcamps.create(bootcamp("b1")).await.unwrap();
        courses.create(course("c1", "b1", 4000.0)).await.unwrap();

        let token = CancellationToken::new();
        let (queue, worker) = spawn_worker(
            AverageCostMaintainer::new(bootcamps.clone(), courses.clone()),
            token.clone(),
        );

        queue.schedule("b1");
        courses.create(course("c2", "b1", 5001.0)).await.unwrap();
        queue.schedule("b1");
        queue.flush().await.unwrap();

        let stored = bootcamps.find_by_id("b1").await.unwrap().unwrap();
        assert_eq!(stored.average_cost, Some(4510.0));

        token.cancel();
        worker.await.unwrap();
        assert!(queue.flush().await.is_err());
    }
}
