use serde::Deserialize;
use serde_json::json;

use super::{Filter, FilterCondition, RepositoryOperation, RepositoryResult, SurrealRepository};
use crate::models::Course;

/// Course storage
pub type CourseRepository = SurrealRepository<Course>;

/// Tuition aggregate over one bootcamp's courses
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TuitionStats {
    /// Arithmetic mean of tuition
    pub average: f64,
    /// Number of courses aggregated
    pub courses: u64,
}

impl SurrealRepository<Course> {
    /// Mean tuition of the bootcamp's courses; `None` when it has none
    pub async fn tuition_stats(&self, bootcamp_id: &str) -> RepositoryResult<Option<TuitionStats>> {
        let rows: Vec<TuitionStats> = self
            .rows(
                RepositoryOperation::Aggregate,
                "SELECT math::mean(tuition) AS average, count() AS courses \
                 FROM course WHERE bootcamp = $bootcamp GROUP ALL"
                    .to_string(),
                vec![("bootcamp".to_string(), json!(bootcamp_id))],
                0,
            )
            .await
            .map_err(|e| e.with_entity_id(bootcamp_id))?;

        Ok(rows.into_iter().find(|stats| stats.courses > 0))
    }

    /// Remove every course of a bootcamp
    pub async fn delete_for_bootcamp(&self, bootcamp_id: &str) -> RepositoryResult<()> {
        self.delete_matching(&Filter::new().and(FilterCondition::eq("bootcamp", bootcamp_id)))
            .await
    }
}
