use axum::extract::State;
use tracing::info;

use super::response::ItemResponse;
use crate::{error::Result, state::AppState};

/// `POST /api/v1/general/data/reset`
///
/// Wipes both collections and reloads the bundled samples. Average costs
/// are recomputed before the response is sent.
pub async fn reset_data(State(state): State<AppState>) -> Result<ItemResponse<&'static str>> {
    let report = state.seeder().reset().await?;
    info!(
        bootcamps = report.bootcamps,
        courses = report.courses,
        "Data reset"
    );
    Ok(ItemResponse::new("Data reset!"))
}
