use axum::{extract::Json, http::StatusCode};
use contracts::system::auth::{LoginRequest, LoginResponse, UserInfo};

use crate::system::auth::extractor::CurrentUser;
use crate::system::{auth::jwt, users::service as user_service};

/// Login handler
pub async fn login(Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, StatusCode> {
    // Verify credentials
    let user = user_service::verify_credentials(&request.username, &request.password)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // Generate token
    let access_token = jwt::generate_access_token(&user.id, &user.username, user.is_admin)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let response = LoginResponse {
        access_token,
        user: UserInfo {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            is_admin: user.is_admin,
        },
    };

    Ok(Json(response))
}

/// Get current user handler (protected by middleware)
pub async fn current_user(CurrentUser(claims): CurrentUser) -> Result<Json<UserInfo>, StatusCode> {
    let user = user_service::get_by_id(&claims.sub)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let user_info = UserInfo {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        is_admin: user.is_admin,
    };

    Ok(Json(user_info))
}
