use axum::{Json, extract::State, http::header, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::{self, CurrentUser};
use crate::db::{models::User, queries};
use crate::error::AppError;
use crate::handlers::UserSummary;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserSummary,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserSummary,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = validation::validate_name(&payload.name)?;
    let email = validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;

    if queries::find_user_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let password_hash = auth::hash_password(payload.password).await?;
    let user = User::new(name, email, password_hash);
    let user = match queries::insert_user(&state.db, &user).await {
        Ok(user) => user,
        // Lost the race against another registration for the same email.
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "user registered");

    let token = auth::issue_token(user.id, &state.config.jwt_secret)?;
    let cookie = auth::session_cookie(&token, state.config.cookie_secure);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            success: true,
            user: UserSummary::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim().to_lowercase();
    validation::validate_required("email", &email)?;
    validation::validate_required("password", &payload.password)?;

    // Same response for unknown email and wrong password.
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = queries::find_user_by_email(&state.db, &email)
        .await?
        .ok_or_else(invalid)?;

    let password_ok =
        auth::verify_password(payload.password, user.password_hash.clone()).await?;
    if !password_ok {
        return Err(invalid());
    }

    tracing::info!(user_id = %user.id, "user logged in");

    let token = auth::issue_token(user.id, &state.config.jwt_secret)?;
    let cookie = auth::session_cookie(&token, state.config.cookie_secure);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            success: true,
            user: UserSummary::from(&user),
        }),
    ))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = auth::clear_session_cookie(state.config.cookie_secure);

    (
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: UserSummary::from(&user),
    })
}
