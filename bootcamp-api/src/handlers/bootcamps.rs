//! Bootcamp endpoints

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, RawQuery, State,
    },
    http::StatusCode,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::{
    courses::insert_course,
    response::{ItemResponse, JsonBody, ListResponse},
};
use crate::{
    error::{Error, Result},
    geo::radius_radians,
    models::{new_id, Bootcamp, BootcampPatch, Course, NewBootcamp, NewCourse},
    query::ListQuery,
    repository::{FilterCondition, Repository, RepositoryError},
    state::AppState,
    uploads::{photo_file_name, photo_too_large, validate_photo},
};

fn not_found(id: &str) -> Error {
    RepositoryError::not_found("Bootcamp", id).into()
}

/// `GET /api/v1/bootcamps`
pub async fn list_bootcamps(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<ListResponse<Value>> {
    let page = ListQuery::parse(raw.as_deref())?
        .execute::<Bootcamp, _>(state.bootcamps())
        .await?;
    Ok(page.into())
}

/// `GET /api/v1/bootcamps/{id}`
pub async fn get_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ItemResponse<Bootcamp>> {
    let bootcamp = state
        .bootcamps()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(ItemResponse::new(bootcamp))
}

/// `POST /api/v1/bootcamps`
#[instrument(skip_all)]
pub async fn create_bootcamp(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewBootcamp>,
) -> Result<ItemResponse<Bootcamp>> {
    let mut bootcamp = payload.build(new_id(), Utc::now())?;

    if bootcamp.location.is_none() {
        bootcamp.location = state.geocoder().geocode(&bootcamp.address).await?;
        if bootcamp.location.is_none() {
            warn!(address = %bootcamp.address, "Address could not be geocoded");
        }
    }

    let bootcamp = state.bootcamps().create(bootcamp).await?;
    info!(bootcamp_id = %bootcamp.id, "Bootcamp created");
    Ok(ItemResponse::created(bootcamp))
}

/// `PUT /api/v1/bootcamps/{id}`
pub async fn update_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<BootcampPatch>,
) -> Result<ItemResponse<Bootcamp>> {
    let patch = patch.prepare()?;
    let bootcamp = state
        .bootcamps()
        .update(&id, patch)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(ItemResponse::new(bootcamp))
}

/// `DELETE /api/v1/bootcamps/{id}`, removing its courses too
#[instrument(skip(state))]
pub async fn delete_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ItemResponse<Value>> {
    if !state.bootcamps().exists(&id).await? {
        return Err(not_found(&id));
    }

    state.courses().delete_for_bootcamp(&id).await?;
    state
        .bootcamps()
        .delete(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    info!("Bootcamp and its courses deleted");
    Ok(ItemResponse::empty())
}

/// `GET /api/v1/bootcamps/radius/{zipcode}/{distance}`, distance in km
#[instrument(skip(state))]
pub async fn bootcamps_in_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, String)>,
) -> Result<ItemResponse<Vec<Bootcamp>>> {
    let distance: f64 = distance
        .trim()
        .parse()
        .ok()
        .filter(|d: &f64| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| Error::BadRequest(format!("Invalid distance '{distance}'")))?;

    let center = state
        .geocoder()
        .geocode(&zipcode)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Could not geocode {zipcode}")))?;

    let bootcamps = state
        .bootcamps()
        .find_near(center.geo_point(), radius_radians(distance))
        .await?;

    let count = bootcamps.len();
    Ok(ItemResponse::new(bootcamps).with_count(count))
}

struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Reading past the body limit means the photo is too large
fn multipart_error(err: MultipartError, max_size: usize) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        photo_too_large(max_size)
    } else {
        err.into()
    }
}

async fn read_file_field(multipart: &mut Multipart, max_size: usize) -> Result<Option<UploadedFile>> {
    let read_error = |err: MultipartError| multipart_error(err, max_size);

    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(read_error)?;
        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

/// `PUT /api/v1/bootcamps/{id}/photo`, multipart field `file`
#[instrument(skip(state, multipart))]
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ItemResponse<String>> {
    if !state.bootcamps().exists(&id).await? {
        return Err(not_found(&id));
    }

    let max_size = state.config().uploads.max_file_upload;
    let no_file = || Error::BadRequest("Please upload a file".into());
    let mut multipart = multipart.map_err(|_| no_file())?;
    let upload = read_file_field(&mut multipart, max_size)
        .await?
        .filter(|upload| !upload.bytes.is_empty())
        .ok_or_else(no_file)?;

    validate_photo(
        upload.content_type.as_deref(),
        upload.bytes.len(),
        max_size,
    )?;

    let name = photo_file_name(
        &id,
        upload.file_name.as_deref(),
        upload.content_type.as_deref().unwrap_or_default(),
    );
    state
        .files()
        .save(&name, &upload.bytes)
        .await
        .map_err(|e| {
            error!(error = %e, file = %name, "Photo write failed");
            Error::Internal("Problem with file upload".into())
        })?;

    state.bootcamps().set_photo(&id, &name).await?;
    info!(file = %name, "Photo uploaded");
    Ok(ItemResponse::new(name))
}

/// `GET /api/v1/bootcamps/{id}/courses`
pub async fn list_bootcamp_courses(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<ListResponse<Value>> {
    let page = ListQuery::parse(raw.as_deref())?
        .scoped_to(FilterCondition::eq("bootcamp", id.as_str()))
        .execute::<Course, _>(state.courses())
        .await?;
    Ok(page.into())
}

/// `POST /api/v1/bootcamps/{id}/courses`; the path decides the parent
pub async fn create_bootcamp_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<NewCourse>,
) -> Result<ItemResponse<Course>> {
    insert_course(
        &state,
        NewCourse {
            bootcamp: Some(id),
            ..payload
        },
    )
    .await
}
