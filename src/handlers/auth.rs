use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::{
    db::{entities::user, enums::Role},
    error::{AppError, Result},
    state::AppState,
};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Registration/login never echo the password hash back.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::Validation(
            "name, email and password are required".to_string(),
        ));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.as_str()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation(
            "email is already registered".to_string(),
        ));
    }

    // Hash before touching the database; a hashing failure aborts the whole
    // registration.
    let hashed = state.auth.hash_password(&payload.password)?;
    let role = Role::from_str(payload.role.as_deref().unwrap_or("listener"));

    let now = Utc::now().into();
    let new_user = user::ActiveModel {
        name: Set(payload.name),
        email: Set(payload.email),
        password: Set(hashed),
        role: Set(role.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_user.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: created.id,
            name: created.name,
            email: created.email,
            role: created.role,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user_row = user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !state
        .auth
        .verify_password(&payload.password, &user_row.password)?
    {
        return Err(AppError::Authentication("Invalid credentials".to_string()));
    }

    let token = state
        .auth
        .issue_token(user_row.id, Role::from_str(&user_row.role))?;

    Ok(Json(LoginResponse { token }))
}
