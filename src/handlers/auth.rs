use axum::{extract::State, http::StatusCode, Json};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    extract::AppJson,
    models::{Credentials, LoginResponse, User},
    password::{hash_password, verify_password, DUMMY_HASH},
};

/// Returns the username with surrounding whitespace removed; that is the
/// form stored and looked up.
fn validate_credentials(payload: &Credentials) -> Result<&str, AppError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(AppError::ValidationError("Username is required".to_string()));
    }
    if payload.password.is_empty() {
        return Err(AppError::ValidationError("Password is required".to_string()));
    }
    Ok(username)
}

#[utoipa::path(
    post,
    path = "/signup",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 201, description = "User created successfully", body = User),
        (status = 400, description = "Username or password missing"),
        (status = 409, description = "Failed to create user (username taken)")
    )
)]
pub async fn signup(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<Credentials>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let username = validate_credentials(&payload)?.to_string();

    let password_hash = hash_password(&payload.password).await?;

    // Uniqueness is left to the UNIQUE constraint on users.username.
    let id = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
        .bind(&username)
        .bind(&password_hash)
        .execute(&pool)
        .await
        .map_err(AppError::create_failed("user"))?
        .last_insert_rowid();

    tracing::info!(user_id = id, username = %username, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(User {
            id,
            username,
            password_hash,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<Credentials>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = validate_credentials(&payload)?;

    let invalid = || AppError::AuthError("Invalid credentials".to_string());

    let Some(user) = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(&pool)
        .await?
    else {
        // Same argon2 cost as a real verify, so response time does not reveal
        // whether the username exists.
        verify_password(&payload.password, DUMMY_HASH).await?;
        tracing::warn!(username = %username, "login for unknown user");
        return Err(invalid());
    };

    if !verify_password(&payload.password, &user.password_hash).await? {
        tracing::warn!(user_id = user.id, "login with wrong password");
        return Err(invalid());
    }

    tracing::debug!(user_id = user.id, "login successful");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user,
    }))
}
