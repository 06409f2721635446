use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use stormbrainer_db::models::ProblemRow;
use stormbrainer_types::api::{CreateProblemRequest, ProblemResponse};

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::parse_timestamp;
use crate::validation::validate_problem;

/// GET /galaxies/{galaxy_id}/problems. Members only, newest first.
pub async fn list_problems(
    State(state): State<AppState>,
    Path(galaxy_id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |st| {
        if !st.db.is_member(galaxy_id, auth.id)? {
            return Err(ApiError::forbidden(
                "You must be a member to view problems in this galaxy.",
            ));
        }
        Ok(st.db.list_problems(galaxy_id)?)
    })
    .await?;

    let problems: Vec<ProblemResponse> = rows.into_iter().map(problem_response).collect();
    Ok(Json(problems))
}

/// POST /galaxies/{galaxy_id}/problems. Only the galaxy owner may post.
pub async fn create_problem(
    State(state): State<AppState>,
    Path(galaxy_id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<CreateProblemRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_problem(&req.title, &req.description)?;

    let creator_id = auth.id;
    let row = blocking(&state, move |st| {
        let galaxy = st
            .db
            .get_galaxy(galaxy_id, creator_id)?
            .ok_or_else(|| ApiError::not_found("Galaxy not found."))?;
        if galaxy.owner_id != creator_id {
            return Err(ApiError::forbidden(
                "Only the galaxy owner can create new problems.",
            ));
        }
        Ok(st.db.create_problem(
            galaxy_id,
            creator_id,
            req.title.trim(),
            req.description.trim(),
        )?)
    })
    .await?;

    info!(problem_id = row.id, galaxy_id, creator_id, "Created problem");
    Ok((StatusCode::CREATED, Json(problem_response(row))))
}

fn problem_response(row: ProblemRow) -> ProblemResponse {
    ProblemResponse {
        id: row.id,
        galaxy_id: row.galaxy_id,
        title: row.title,
        description: row.description,
        creator_id: row.creator_id,
        creator_username: row.creator_username,
        stars: row.stars,
        solution_count: row.solution_count,
        created_at: parse_timestamp(&row.created_at),
    }
}
