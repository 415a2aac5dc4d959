//! Mantra catalog API handlers.

use axum::extract::State;
use axum::Json;

use super::store::Mantra;
use crate::state::AppState;

/// GET /api/mantras
///
/// The full catalog in creation order.
pub async fn list_mantras(State(state): State<AppState>) -> Json<Vec<Mantra>> {
    Json(state.mantras.list())
}
