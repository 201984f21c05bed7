use anyhow::Result;
use chrono::Utc;
use contracts::system::users::User;

use super::repository;
use crate::system::auth::password;

/// Verify user credentials (for login)
pub async fn verify_credentials(username: &str, password_plain: &str) -> Result<Option<User>> {
    let user = match repository::get_by_username(username).await? {
        Some(u) => u,
        None => return Ok(None),
    };

    if !user.is_active {
        return Err(anyhow::anyhow!("User account is inactive"));
    }

    let password_hash = repository::get_password_hash(&user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Password hash not found"))?;

    if !password::verify_password(password_plain, &password_hash)? {
        return Ok(None);
    }

    let _ = repository::update_last_login(&user.id).await;

    Ok(Some(user))
}

pub async fn get_by_id(id: &str) -> Result<Option<User>> {
    repository::get_by_id(id).await
}

/// Seed the default admin account when the user table is empty
pub async fn ensure_default_admin() -> Result<()> {
    if repository::count().await? > 0 {
        return Ok(());
    }

    let now = Utc::now().to_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: "admin".to_string(),
        full_name: Some("Administrator".to_string()),
        is_active: true,
        is_admin: true,
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
    };

    let default_password = "admin123";
    password::validate_password_strength(default_password)?;
    let password_hash = password::hash_password(default_password)?;
    repository::create_with_password(&user, &password_hash).await?;

    tracing::warn!("Created default admin account (admin/admin123) - change the password");
    Ok(())
}
