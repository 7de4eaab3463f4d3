//! Course endpoints
//!
//! Every successful write schedules an `averageCost` recompute for the
//! affected bootcamp(s). Responses never wait for it.

use std::collections::{HashMap, HashSet};

use axum::extract::{Path, RawQuery, State};
use chrono::Utc;
use futures::future::try_join_all;
use serde_json::Value;
use tracing::info;

use super::response::{ItemResponse, JsonBody, ListResponse};
use crate::{
    error::{Error, Result},
    models::{new_id, BootcampSummary, Course, CoursePatch, NewCourse},
    query::ListQuery,
    repository::{Repository, RepositoryError},
    state::AppState,
};

fn not_found(id: &str) -> Error {
    RepositoryError::not_found("Course", id).into()
}

fn missing_bootcamp(id: &str) -> Error {
    Error::NotFound(format!("No bootcamp with the id of {id}"))
}

/// Replace each item's `bootcamp` key with `{id, name, description}`
async fn populate_bootcamps(state: &AppState, items: &mut [Value]) -> Result<()> {
    let ids: HashSet<String> = items
        .iter()
        .filter_map(|item| item.get("bootcamp")?.as_str().map(str::to_string))
        .collect();

    let found = try_join_all(ids.iter().map(|id| state.bootcamps().find_by_id(id))).await?;
    let summaries: HashMap<String, Value> = found
        .iter()
        .flatten()
        .map(|bootcamp| {
            let summary = serde_json::to_value(BootcampSummary::from(bootcamp))
                .map_err(|e| Error::Internal(format!("Failed to serialize bootcamp: {e}")))?;
            Ok::<_, Error>((bootcamp.id.clone(), summary))
        })
        .collect::<Result<_>>()?;

    for item in items.iter_mut() {
        let Some(slot) = item.get_mut("bootcamp") else {
            continue;
        };
        if let Some(summary) = slot.as_str().and_then(|id| summaries.get(id)) {
            *slot = summary.clone();
        }
    }
    Ok(())
}

/// `GET /api/v1/courses`
pub async fn list_courses(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<ListResponse<Value>> {
    let mut page = ListQuery::parse(raw.as_deref())?
        .execute::<Course, _>(state.courses())
        .await?;
    populate_bootcamps(&state, &mut page.items).await?;
    Ok(page.into())
}

/// `GET /api/v1/courses/{id}`
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ItemResponse<Value>> {
    let course = state
        .courses()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    let mut items = [serde_json::to_value(&course)
        .map_err(|e| Error::Internal(format!("Failed to serialize course: {e}")))?];
    populate_bootcamps(&state, &mut items).await?;
    let [item] = items;
    Ok(ItemResponse::new(item))
}

/// Create a course under an existing bootcamp and schedule its recompute
pub(crate) async fn insert_course(state: &AppState, payload: NewCourse) -> Result<ItemResponse<Course>> {
    let course = payload.build(new_id(), Utc::now())?;

    if !state.bootcamps().exists(&course.bootcamp).await? {
        return Err(missing_bootcamp(&course.bootcamp));
    }

    let course = state.courses().create(course).await?;
    state.aggregates().schedule(course.bootcamp.as_str());

    info!(course_id = %course.id, bootcamp_id = %course.bootcamp, "Course created");
    Ok(ItemResponse::created(course))
}

/// `POST /api/v1/courses`; the parent comes from the body
pub async fn create_course(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewCourse>,
) -> Result<ItemResponse<Course>> {
    insert_course(&state, payload).await
}

/// `PUT /api/v1/courses/{id}`
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<CoursePatch>,
) -> Result<ItemResponse<Course>> {
    let patch = patch.prepare()?;

    let existing = state
        .courses()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    if let Some(parent) = patch.bootcamp.as_deref() {
        if parent != existing.bootcamp && !state.bootcamps().exists(parent).await? {
            return Err(missing_bootcamp(parent));
        }
    }

    let course = state
        .courses()
        .update(&id, patch)
        .await?
        .ok_or_else(|| not_found(&id))?;

    state.aggregates().schedule(existing.bootcamp.as_str());
    if course.bootcamp != existing.bootcamp {
        state.aggregates().schedule(course.bootcamp.as_str());
    }

    Ok(ItemResponse::new(course))
}

/// `DELETE /api/v1/courses/{id}`
pub async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ItemResponse<Value>> {
    let course = state
        .courses()
        .delete(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    state.aggregates().schedule(course.bootcamp);

    info!(course_id = %id, "Course deleted");
    Ok(ItemResponse::empty())
}
