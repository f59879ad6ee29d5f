use std::str::FromStr;

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{self, Role, UserWithPassword},
    },
    error::{ApiError, JsonBody},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (email, password, name) = match (body.email, body.password, body.name) {
        (Some(e), Some(p), Some(n)) => (e, p, n),
        _ => {
            return Err(ApiError::Validation(
                "Missing required fields (email, password, name)".into(),
            ))
        }
    };

    if !is_valid_email(&email) {
        warn!("register with invalid email format");
        return Err(ApiError::Validation("Invalid email format".into()));
    }
    if password.len() < 6 {
        warn!("register with too short password");
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".into(),
        ));
    }
    let role = match body.role.as_deref() {
        None => Role::Student,
        Some(r) => Role::from_str(r).map_err(|_| {
            ApiError::Validation("Invalid role. Must be admin, instructor, or student".into())
        })?,
    };

    let hash = hash_password(&password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal(e)
    })?;

    let user = repo::create_user(&state.db, &email, &name, &hash, role).await?;

    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            message: "User registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (email, password) = match (body.email, body.password) {
        (Some(e), Some(p)) => (e, p),
        _ => return Err(ApiError::Validation("Missing email or password".into())),
    };

    // Unknown email and wrong password answer identically.
    let user = match UserWithPassword::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            warn!("login for unknown email");
            return Err(ApiError::Unauthorized("Invalid email or password".into()));
        }
    };

    let ok = verify_password(&password, &user.password).map_err(|e| {
        error!(error = %e, "verify_password failed");
        ApiError::Internal(e)
    })?;
    if !ok {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Unauthorized("Invalid email or password".into()));
    }

    let role = Role::from_str(&user.role).map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user.id, &user.email, role).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e)
    })?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip_all)]
pub async fn me(auth: AuthUser) -> Json<MeResponse> {
    Json(MeResponse { user: auth.user })
}
