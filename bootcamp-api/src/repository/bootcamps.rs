use serde_json::json;

use super::{RepositoryOperation, RepositoryResult, SurrealRepository};
use crate::{
    geo::{bounding_box, GeoPoint},
    models::Bootcamp,
};

/// Bootcamp storage
pub type BootcampRepository = SurrealRepository<Bootcamp>;

impl SurrealRepository<Bootcamp> {
    /// Overwrite the derived average cost
    pub async fn set_average_cost(&self, id: &str, average_cost: f64) -> RepositoryResult<()> {
        self.merge_fields(id, json!({ "averageCost": average_cost }))
            .await
            .map_err(|e| e.with_entity_id(id))
    }

    /// Point the bootcamp at a stored photo
    pub async fn set_photo(&self, id: &str, photo: &str) -> RepositoryResult<()> {
        self.merge_fields(id, json!({ "photo": photo }))
            .await
            .map_err(|e| e.with_entity_id(id))
    }

    /// Bootcamps located within `radians` of `center`.
    ///
    /// The store narrows candidates with a degree bounding box; the exact
    /// great-circle check runs here.
    pub async fn find_near(&self, center: GeoPoint, radians: f64) -> RepositoryResult<Vec<Bootcamp>> {
        let bbox = bounding_box(center, radians);

        let mut predicates = vec![
            "location.coordinates[1] >= $min_lat",
            "location.coordinates[1] <= $max_lat",
        ];
        let mut bindings = vec![
            ("min_lat".to_string(), json!(bbox.min_latitude)),
            ("max_lat".to_string(), json!(bbox.max_latitude)),
        ];

        if let Some((min_lng, max_lng)) = bbox.longitude {
            predicates.push("location.coordinates[0] >= $min_lng");
            predicates.push("location.coordinates[0] <= $max_lng");
            bindings.push(("min_lng".to_string(), json!(min_lng)));
            bindings.push(("max_lng".to_string(), json!(max_lng)));
        }

        let sql = format!(
            "SELECT *, record::id(id) AS id FROM bootcamp WHERE {}",
            predicates.join(" AND ")
        );
        let candidates: Vec<Bootcamp> = self
            .rows(RepositoryOperation::FindAll, sql, bindings, 0)
            .await?;

        Ok(candidates
            .into_iter()
            .filter(|bootcamp| {
                bootcamp
                    .location
                    .as_ref()
                    .is_some_and(|location| center.within(&location.geo_point(), radians))
            })
            .collect())
    }
}
