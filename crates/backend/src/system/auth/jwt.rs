use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::TokenClaims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;

const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Generate JWT access token with 24 hours lifetime
pub async fn generate_access_token(user_id: &str, username: &str, is_admin: bool) -> Result<String> {
    let now = Utc::now();
    let exp = (now + chrono::Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claims = TokenClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        is_admin,
        exp,
        iat,
    };

    let secret = get_jwt_secret().await?;
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")?;

    Ok(token)
}

/// Validate JWT token and extract claims
pub async fn validate_token(token: &str) -> Result<TokenClaims> {
    let secret = get_jwt_secret().await?;

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;

    Ok(token_data.claims)
}

/// Get or create JWT secret from the sys_setting table
///
/// A transient read error propagates; regenerating the secret on it
/// would invalidate every outstanding token.
pub async fn get_jwt_secret() -> Result<String> {
    match get_jwt_secret_from_db().await? {
        Some(secret) => Ok(secret),
        None => {
            let secret = generate_jwt_secret();
            save_jwt_secret_to_db(&secret).await?;
            Ok(secret)
        }
    }
}

/// Generate a cryptographically secure JWT secret (256 bits)
fn generate_jwt_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    general_purpose::STANDARD.encode(&random_bytes)
}

async fn get_jwt_secret_from_db() -> Result<Option<String>> {
    use crate::shared::data::db::get_connection;
    use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

    let conn = get_connection();

    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT value FROM sys_setting WHERE key = ?",
            ["jwt_secret".into()],
        ))
        .await?;

    match result {
        Some(row) => Ok(Some(row.try_get("", "value")?)),
        None => Ok(None),
    }
}

async fn save_jwt_secret_to_db(secret: &str) -> Result<()> {
    use crate::shared::data::db::get_connection;
    use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

    let conn = get_connection();

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO sys_setting (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        ["jwt_secret".into(), secret.into()],
    ))
    .await
    .context("Failed to save JWT secret")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Один тест на весь сценарий: соединение с БД глобальное (OnceCell)
    // и инициализируется в тестовом бинаре один раз.
    #[tokio::test]
    async fn secret_is_persisted_and_tokens_round_trip() {
        let db_path = std::env::temp_dir()
            .join("spec_backend_tests")
            .join(format!("jwt_{}.db", uuid::Uuid::new_v4()));
        crate::shared::data::db::initialize_database(&db_path.to_string_lossy())
            .await
            .unwrap();

        let first = get_jwt_secret().await.unwrap();
        let second = get_jwt_secret().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(get_jwt_secret_from_db().await.unwrap(), Some(first));

        let token = generate_access_token("u1", "admin", true).await.unwrap();
        let claims = validate_token(&token).await.unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.username, "admin");
        assert!(claims.is_admin);
    }
}
