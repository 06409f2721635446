use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use stormbrainer_db::RateOutcome;
use stormbrainer_db::models::SolutionRow;
use stormbrainer_types::api::{CreateSolutionRequest, SolutionResponse};

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::parse_timestamp;
use crate::validation::validate_solution;

/// GET /problems/{problem_id}/solutions
///
/// Ordered by stars descending, then earliest submission. Solutions inside a
/// private galaxy are visible to members only.
pub async fn list_solutions(
    State(state): State<AppState>,
    Path(problem_id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |st| {
        let problem = st
            .db
            .get_problem(problem_id)?
            .ok_or_else(|| ApiError::not_found("Problem not found."))?;
        let galaxy = st
            .db
            .get_galaxy(problem.galaxy_id, auth.id)?
            .ok_or_else(|| ApiError::not_found("Galaxy not found."))?;
        if !galaxy.is_public && !galaxy.is_member {
            return Err(ApiError::forbidden(
                "You must be a member of the galaxy to view its solutions.",
            ));
        }
        Ok(st.db.list_solutions(problem_id)?)
    })
    .await?;

    let solutions: Vec<SolutionResponse> = rows.into_iter().map(solution_response).collect();
    Ok(Json(solutions))
}

/// POST /problems/{problem_id}/solutions. Members only.
pub async fn create_solution(
    State(state): State<AppState>,
    Path(problem_id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<CreateSolutionRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_solution(&req.text)?;

    let author_id = auth.id;
    let row = blocking(&state, move |st| {
        let problem = st
            .db
            .get_problem(problem_id)?
            .ok_or_else(|| ApiError::not_found("Problem not found."))?;
        if !st.db.is_member(problem.galaxy_id, author_id)? {
            return Err(ApiError::forbidden(
                "You must be a member of the galaxy to post a solution.",
            ));
        }
        Ok(st.db.create_solution(problem_id, author_id, &req.text)?)
    })
    .await?;

    info!(solution_id = row.id, problem_id, author_id, "Created solution");
    Ok((StatusCode::CREATED, Json(solution_response(row))))
}

/// POST /solutions/{solution_id}/rate. Awards one star, once per rater.
pub async fn rate_solution(
    State(state): State<AppState>,
    Path(solution_id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rater_id = auth.id;
    let row = blocking(&state, move |st| {
        let solution = st
            .db
            .get_solution(solution_id)?
            .ok_or_else(|| ApiError::not_found("Solution not found."))?;
        if !st.db.is_member(solution.galaxy_id, rater_id)? {
            return Err(ApiError::forbidden(
                "You must be a member of the galaxy to rate its solutions.",
            ));
        }

        match st.db.rate_solution(solution_id, rater_id)? {
            RateOutcome::Rated(row) => Ok(row),
            RateOutcome::AlreadyRated => Err(ApiError::AlreadyRated),
            RateOutcome::SolutionNotFound => Err(ApiError::not_found("Solution not found.")),
        }
    })
    .await?;

    Ok(Json(solution_response(row)))
}

fn solution_response(row: SolutionRow) -> SolutionResponse {
    SolutionResponse {
        id: row.id,
        problem_id: row.problem_id,
        author_id: row.author_id,
        author_username: row.author_username,
        text: row.text,
        stars: row.stars,
        created_at: parse_timestamp(&row.created_at),
    }
}
