use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::crypto::hash_token;
use crate::db::{AppState, queries};
use crate::models::User;

/// The authenticated user, inserted as a request extension by [`user_auth`].
#[derive(Clone)]
pub struct AuthedUser(pub User);

/// Bearer-token authentication for the synchronous payment endpoints.
///
/// Tokens are looked up by hash; the raw token never touches the database.
pub async fn user_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let conn = state.db.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let user = queries::get_user_by_token_hash(&conn, &hash_token(token))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // Return the connection to the pool before the handler runs; holding it
    // across the handler would starve a small pool.
    drop(conn);

    request.extensions_mut().insert(AuthedUser(user));

    Ok(next.run(request).await)
}
