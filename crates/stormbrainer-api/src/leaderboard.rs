use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use stormbrainer_types::api::RankedUser;

use crate::auth::{AppState, blocking};
use crate::error::ApiError;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
}

/// GET /leaderboard. Computed on every request; rank is the 1-based position.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let rows = blocking(&state, move |st| Ok(st.db.leaderboard(limit)?)).await?;

    let ranked: Vec<RankedUser> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| RankedUser {
            rank: i + 1,
            id: row.id,
            username: row.username,
            rating: row.rating,
        })
        .collect();

    Ok(Json(ranked))
}
