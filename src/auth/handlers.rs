use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, MessageResponse, RegisterRequest},
        jwt::SessionKeys,
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    state::AppState,
    validate::validate_credentials,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let creds = validate_credentials(&payload.name, &payload.password).map_err(|errors| {
        warn!(count = errors.len(), "register validation failed");
        ApiError::Validation(errors)
    })?;

    let hash = hash_password(&creds.password)?;
    let user = User::create(&state.db, &creds.name, &hash).await?;

    info!(user_id = %user.id, name = %user.name, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse { message: "user created" }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let creds = validate_credentials(&payload.name, &payload.password).map_err(|errors| {
        warn!(count = errors.len(), "login validation failed");
        ApiError::Validation(errors)
    })?;

    // Unknown name and wrong password answer identically so the response
    // never reveals whether a username exists.
    let Some(user) = User::find_by_name(&state.db, &creds.name).await? else {
        warn!("login with unknown name");
        return Err(ApiError::InvalidCredentials);
    };
    if !verify_password(&creds.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.name)?;

    info!(user_id = %user.id, name = %user.name, "user logged in");
    Ok((
        jar.add(keys.session_cookie(token)),
        Json(MessageResponse { message: "logged in" }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let keys = SessionKeys::from_ref(&state);
    (
        jar.remove(keys.removal_cookie()),
        Json(MessageResponse { message: "logged out" }),
    )
}
