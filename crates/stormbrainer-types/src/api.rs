use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Category;

// -- JWT Claims --

/// Bearer token claims. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

// -- Galaxies --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGalaxyRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_public: bool,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalaxyResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub is_public: bool,
    pub owner_id: i64,
    pub owner_username: String,
    pub is_member: bool,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinGalaxyRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinGalaxyResponse {
    pub message: String,
    pub galaxy_id: i64,
}

// -- Problems --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProblemRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemResponse {
    pub id: i64,
    pub galaxy_id: i64,
    pub title: String,
    pub description: String,
    pub creator_id: i64,
    pub creator_username: String,
    pub stars: i64,
    pub solution_count: i64,
    pub created_at: DateTime<Utc>,
}

// -- Solutions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSolutionRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionResponse {
    pub id: i64,
    pub problem_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub text: String,
    pub stars: i64,
    pub created_at: DateTime<Utc>,
}

// -- Leaderboard --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedUser {
    pub rank: usize,
    pub id: i64,
    pub username: String,
    pub rating: i64,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
