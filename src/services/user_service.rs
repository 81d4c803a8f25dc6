use crate::{
    db::DbPool,
    dto::users::{UpdatePasswordRequest, UpdateProfileRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::{hash_password, verify_password},
};

pub async fn get_me(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let me: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;
    let me = match me {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("OK", me, None))
}

pub async fn update_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    if let Some(full_name) = payload.full_name.as_ref() {
        if full_name.trim().is_empty() {
            return Err(AppError::Validation("full_name must not be empty".into()));
        }
    }

    let updated: Option<User> = sqlx::query_as(
        r#"
        UPDATE users
        SET full_name = COALESCE($2, full_name),
            phone_number = COALESCE($3, phone_number),
            gender = COALESCE($4, gender),
            birth_date = COALESCE($5, birth_date),
            citizen = COALESCE($6, citizen),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.full_name)
    .bind(payload.phone_number)
    .bind(payload.gender)
    .bind(payload.birth_date)
    .bind(payload.citizen)
    .fetch_optional(pool)
    .await?;

    let updated = match updated {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "Profile updated",
        updated,
        Some(Meta::empty()),
    ))
}

pub async fn update_password(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdatePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.new_password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    if payload.new_password != payload.confirm_password {
        return Err(AppError::Validation("passwords do not match".into()));
    }

    let stored: Option<(String,)> = sqlx::query_as("SELECT password_hash FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;
    let stored = match stored {
        Some((hash,)) => hash,
        None => return Err(AppError::NotFound),
    };

    if !verify_password(&payload.old_password, &stored)? {
        return Err(AppError::Validation("old password is incorrect".into()));
    }

    let new_hash = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(user.user_id)
        .bind(new_hash)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success(
        "Password updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
