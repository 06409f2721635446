pub mod auth;
pub mod error;
pub mod galaxies;
pub mod leaderboard;
pub mod middleware;
pub mod problems;
pub mod solutions;
pub mod validation;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use crate::auth::AppState;
use crate::middleware::require_auth;

/// Build the full HTTP surface. Every route except registration, login,
/// the leaderboard and the health check requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/leaderboard", get(leaderboard::get_leaderboard))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/galaxies", get(galaxies::list_galaxies).post(galaxies::create_galaxy))
        .route("/galaxies/{galaxy_id}", get(galaxies::get_galaxy))
        .route("/galaxies/{galaxy_id}/join", post(galaxies::join_galaxy))
        .route(
            "/galaxies/{galaxy_id}/problems",
            get(problems::list_problems).post(problems::create_problem),
        )
        .route(
            "/problems/{problem_id}/solutions",
            get(solutions::list_solutions).post(solutions::create_solution),
        )
        .route("/solutions/{solution_id}/rate", post(solutions::rate_solution))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Parse a stored timestamp. Rows written by the schema defaults are RFC 3339;
/// plain `datetime('now')` values ("YYYY-MM-DD HH:MM:SS") are read as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_timestamp_formats() {
        let a = parse_timestamp("2026-10-15T12:30:00.250Z");
        let b = parse_timestamp("2026-10-15 12:30:00");
        assert_eq!(a.timestamp(), b.timestamp());
        assert_eq!(parse_timestamp("garbage"), DateTime::<Utc>::default());
    }
}
