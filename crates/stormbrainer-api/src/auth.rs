use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};

use stormbrainer_db::Database;
use stormbrainer_db::models::UserRow;
use stormbrainer_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest, UserResponse};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::parse_timestamp;
use crate::validation::{validate_login, validate_register};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: impl Into<String>, token_ttl: chrono::Duration) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret: jwt_secret.into(),
            token_ttl,
        })
    }
}

/// Run blocking DB (and password hashing) work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(state.as_ref())).await?
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_register(&req.username, &req.email, &req.password)?;

    let user = blocking(&state, move |st| {
        if st.db.get_user_by_email(&req.email)?.is_some() {
            return Err(ApiError::Conflict("User with this email already exists.".into()));
        }

        let password_hash = hash_password(&req.password)?;

        st.db
            .create_user(&req.username, &req.email, &password_hash)?
            .ok_or_else(|| ApiError::Conflict("Username or email is already taken.".into()))
    })
    .await?;

    let token = create_token(&state.jwt_secret, user.id, &user.username, state.token_ttl)?;
    info!(user_id = user.id, "Registered user {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user_response(user),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_login(&req.email, &req.password)?;

    let user = blocking(&state, move |st| {
        // Unknown email and wrong password must look the same to the caller.
        let Some(user) = st.db.get_user_by_email(&req.email)? else {
            warn!("Login attempt for unknown email");
            return Err(ApiError::unauthorized("Invalid credentials."));
        };
        if !verify_password(&req.password, &user.password_hash)? {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(ApiError::unauthorized("Invalid credentials."));
        }
        Ok(user)
    })
    .await?;

    let token = create_token(&state.jwt_secret, user.id, &user.username, state.token_ttl)?;

    Ok(Json(AuthResponse {
        user: user_response(user),
        token,
    }))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |st| {
        st.db
            .get_user_by_id(auth.id)?
            .ok_or_else(|| ApiError::unauthorized("User no longer exists."))
    })
    .await?;

    Ok(Json(user_response(user)))
}

pub(crate) fn user_response(row: UserRow) -> UserResponse {
    UserResponse {
        id: row.id,
        username: row.username,
        email: row.email,
        rating: row.rating,
        created_at: parse_timestamp(&row.created_at),
    }
}

/// Argon2id hash in PHC string format with a fresh random salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// Returns false on mismatch; errors only if the stored hash is unreadable.
pub fn verify_password(password: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Stored password hash is corrupt: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn create_token(
    secret: &str,
    user_id: i64,
    username: &str,
    ttl: chrono::Duration,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Check signature and expiry. Does not touch the store.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid token.")
    })
}
