use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::auth::{AppState, blocking, decode_token};
use crate::error::ApiError;

/// The authenticated caller, inserted as a request extension by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// Validate the bearer token and confirm the user still exists.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.map_err(|_| ApiError::unauthorized("Access denied. No token provided."))?;

    let claims = decode_token(&state.jwt_secret, bearer.token())?;

    let user = blocking(&state, move |st| {
        st.db
            .get_user_by_id(claims.sub)?
            .ok_or_else(|| ApiError::unauthorized("Access denied. User no longer exists."))
    })
    .await?;

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
    });
    Ok(next.run(req).await)
}
