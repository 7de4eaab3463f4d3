//! Route table

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::{
    error::Error,
    handlers::{bootcamps, courses, general},
    health,
    state::AppState,
};

/// All routes, with state attached
pub fn router(state: AppState) -> Router {
    let upload_limit = state.config().upload_body_limit();
    let uploads_dir = state.config().uploads.path.clone();

    Router::new()
        .route(
            "/api/v1/bootcamps",
            get(bootcamps::list_bootcamps).post(bootcamps::create_bootcamp),
        )
        .route(
            "/api/v1/bootcamps/radius/{zipcode}/{distance}",
            get(bootcamps::bootcamps_in_radius),
        )
        .route(
            "/api/v1/bootcamps/{id}",
            get(bootcamps::get_bootcamp)
                .put(bootcamps::update_bootcamp)
                .delete(bootcamps::delete_bootcamp),
        )
        .route(
            "/api/v1/bootcamps/{id}/photo",
            put(bootcamps::upload_photo).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/bootcamps/{id}/courses",
            get(bootcamps::list_bootcamp_courses).post(bootcamps::create_bootcamp_course),
        )
        .route(
            "/api/v1/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/api/v1/courses/{id}",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/api/v1/general/data/reset", post(general::reset_data))
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .fallback(route_not_found)
        .with_state(state)
}

async fn route_not_found() -> Error {
    Error::NotFound("Route not found".into())
}
