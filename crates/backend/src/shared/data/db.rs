use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Открыть соединение с sqlite и подготовить минимальную схему.
/// Вызывается один раз при старте процесса.
pub async fn initialize_database(db_path: &str) -> anyhow::Result<()> {
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_path).is_absolute() {
        std::path::PathBuf::from(db_path)
    } else {
        std::env::current_dir()?.join(db_path)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database at {}", db_url);
    let conn = Database::connect(&db_url).await?;

    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

/// Ensure required tables exist (minimal schema bootstrap)
async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let statements = [
        // Мастер-запись спецификации. Id присваивается при первом сохранении.
        r#"
        CREATE TABLE IF NOT EXISTS a001_product_specification (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL,
            description TEXT NOT NULL,
            comment TEXT,
            brand TEXT NOT NULL DEFAULT '',
            line_name TEXT NOT NULL DEFAULT '',
            distribution TEXT NOT NULL DEFAULT 'domestic',
            category_large TEXT NOT NULL DEFAULT '',
            category_medium TEXT NOT NULL DEFAULT '',
            category_small TEXT NOT NULL DEFAULT '',
            product_name_intl TEXT NOT NULL DEFAULT '',
            barcode TEXT NOT NULL DEFAULT '',
            volume TEXT NOT NULL DEFAULT '',
            consumer_price TEXT NOT NULL DEFAULT '0.00',
            reference_no TEXT NOT NULL DEFAULT '',
            is_functional INTEGER NOT NULL DEFAULT 0,
            manufacturer TEXT NOT NULL DEFAULT '',
            planning_manager TEXT NOT NULL DEFAULT '',
            design_manager TEXT NOT NULL DEFAULT '',
            supply_chain_manager TEXT NOT NULL DEFAULT '',
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
        "#,
        // Строки состава. Заменяются целиком при каждом сохранении мастера,
        // денежные значения хранятся текстом с двумя знаками.
        r#"
        CREATE TABLE IF NOT EXISTS a001_specification_detail (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            category TEXT NOT NULL,
            sub_category TEXT NOT NULL DEFAULT '',
            material TEXT NOT NULL DEFAULT '',
            spec TEXT NOT NULL DEFAULT '',
            unit_cost TEXT NOT NULL DEFAULT '0.00',
            supplier TEXT NOT NULL DEFAULT ''
        );
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_a001_specification_detail_product
            ON a001_specification_detail (product_id, position);
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS sys_user (
            id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            full_name TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_login_at TEXT
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS sys_setting (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );
        "#,
    ];

    for sql in statements {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            sql.to_string(),
        ))
        .await?;
    }

    tracing::info!("Database schema is ready");
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}
