use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::{info, warn};

use stormbrainer_db::models::{GalaxyRow, NewGalaxy};
use stormbrainer_types::api::{
    CreateGalaxyRequest, GalaxyResponse, JoinGalaxyRequest, JoinGalaxyResponse,
};
use stormbrainer_types::models::{Category, GalaxyFilter};

use crate::auth::{AppState, blocking, hash_password, verify_password};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::parse_timestamp;

#[derive(Debug, Deserialize)]
pub struct GalaxyQuery {
    pub filter: Option<String>,
}

/// GET /galaxies?filter=public|joined
pub async fn list_galaxies(
    State(state): State<AppState>,
    Query(query): Query<GalaxyQuery>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = GalaxyFilter::parse_lossy(query.filter.as_deref());

    let rows = blocking(&state, move |st| Ok(st.db.list_galaxies(auth.id, filter)?)).await?;

    let galaxies: Vec<GalaxyResponse> = rows.into_iter().map(galaxy_response).collect();
    Ok(Json(galaxies))
}

/// POST /galaxies. The creator becomes owner and first member.
pub async fn create_galaxy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<CreateGalaxyRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() || req.category.trim().is_empty() {
        return Err(ApiError::invalid("Galaxy name and category are required."));
    }
    let category: Category = req
        .category
        .trim()
        .parse()
        .map_err(|e| ApiError::invalid(format!("Invalid category: {}", e)))?;

    // Public galaxies never keep a password, even if one was sent.
    let password = if req.is_public {
        None
    } else {
        match req.password.filter(|p| !p.is_empty()) {
            Some(p) => Some(p),
            None => return Err(ApiError::invalid("Private galaxies require a password.")),
        }
    };

    let owner_id = auth.id;
    let row = blocking(&state, move |st| {
        let password_hash = password.as_deref().map(hash_password).transpose()?;
        let row = st.db.create_galaxy(&NewGalaxy {
            name: &name,
            description: req.description.as_deref(),
            category: category.as_str(),
            is_public: req.is_public,
            password_hash: password_hash.as_deref(),
            owner_id,
        })?;
        Ok(row)
    })
    .await?;

    info!(
        galaxy_id = row.id,
        owner_id,
        is_public = row.is_public,
        "Created galaxy {}",
        row.name
    );
    Ok((StatusCode::CREATED, Json(galaxy_response(row))))
}

/// GET /galaxies/{galaxy_id}. Private galaxies are visible to members only.
pub async fn get_galaxy(
    State(state): State<AppState>,
    Path(galaxy_id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let row = blocking(&state, move |st| {
        let galaxy = st
            .db
            .get_galaxy(galaxy_id, auth.id)?
            .ok_or_else(|| ApiError::not_found("Galaxy not found."))?;
        if !galaxy.is_public && !galaxy.is_member {
            return Err(ApiError::forbidden(
                "You must be a member to view this private galaxy.",
            ));
        }
        Ok(galaxy)
    })
    .await?;

    Ok(Json(galaxy_response(row)))
}

/// POST /galaxies/{galaxy_id}/join
///
/// Idempotent. Private galaxies check the password before the membership row
/// is written; a failed check never changes anything.
pub async fn join_galaxy(
    State(state): State<AppState>,
    Path(galaxy_id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    // The body is optional for public galaxies.
    let req: JoinGalaxyRequest = if body.iter().all(u8::is_ascii_whitespace) {
        JoinGalaxyRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::invalid(format!("Invalid request body: {}", e)))?
    };
    let password = req.password;
    let user_id = auth.id;

    let message = blocking(&state, move |st| {
        let galaxy = st
            .db
            .get_galaxy(galaxy_id, user_id)?
            .ok_or_else(|| ApiError::not_found("Galaxy not found."))?;

        if galaxy.is_member {
            return Ok("Already a member of this galaxy.".to_string());
        }

        if !galaxy.is_public {
            let (Some(password), Some(stored)) =
                (password.filter(|p| !p.is_empty()), galaxy.password_hash.as_deref())
            else {
                return Err(ApiError::unauthorized(
                    "This is a private galaxy. Password required.",
                ));
            };
            if !verify_password(&password, stored)? {
                warn!(galaxy_id, user_id, "Wrong password for private galaxy");
                return Err(ApiError::unauthorized(
                    "Incorrect password for this private galaxy.",
                ));
            }
        }

        if st.db.add_member(galaxy_id, user_id)? {
            info!(galaxy_id, user_id, "User joined galaxy");
        }
        Ok(format!("Successfully joined galaxy: {}.", galaxy.name))
    })
    .await?;

    Ok(Json(JoinGalaxyResponse { message, galaxy_id }))
}

fn galaxy_response(row: GalaxyRow) -> GalaxyResponse {
    let category = row.category.parse().unwrap_or_else(|e| {
        warn!("Corrupt category on galaxy {}: {}", row.id, e);
        Category::General
    });
    GalaxyResponse {
        id: row.id,
        name: row.name,
        description: row.description,
        category,
        is_public: row.is_public,
        owner_id: row.owner_id,
        owner_username: row.owner_username,
        is_member: row.is_member,
        member_count: row.member_count,
        created_at: parse_timestamp(&row.created_at),
    }
}
