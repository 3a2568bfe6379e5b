use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Create a SQLite connection pool for `database_url`.
///
/// The database file is created if missing. Returns a `sqlx::SqlitePool` or
/// an error if the URL is malformed or the pool cannot be created.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

/// Round-trip latency of a trivial query.
pub async fn ping(pool: &SqlitePool) -> Result<Duration, sqlx::Error> {
    let start = std::time::Instant::now();
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(start.elapsed())
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        is_admin BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        last_login TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        remember BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        revoked BOOLEAN NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS contact_message (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre TEXT NOT NULL,
        email TEXT NOT NULL,
        telefono TEXT,
        servicio TEXT NOT NULL,
        mensaje TEXT NOT NULL,
        leido BOOLEAN NOT NULL DEFAULT 0,
        fecha TEXT NOT NULL,
        ip_address TEXT,
        respuesta TEXT,
        fecha_respuesta TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_contact_message_fecha ON contact_message(fecha DESC)",
    "CREATE INDEX IF NOT EXISTS idx_contact_message_servicio ON contact_message(servicio)",
    r#"
    CREATE TABLE IF NOT EXISTS project (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        titulo TEXT NOT NULL,
        descripcion_problema TEXT NOT NULL,
        descripcion_solucion TEXT NOT NULL,
        resultados TEXT NOT NULL,
        imagen_url TEXT,
        categoria TEXT,
        activo BOOLEAN NOT NULL DEFAULT 1,
        orden INTEGER NOT NULL DEFAULT 0,
        cliente TEXT,
        tecnologias TEXT,
        duracion TEXT,
        fecha_creacion TEXT NOT NULL,
        fecha_actualizacion TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_project_activo_orden ON project(activo, orden)",
    r#"
    CREATE TABLE IF NOT EXISTS testimonial (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre_cliente TEXT NOT NULL,
        empresa TEXT,
        cargo TEXT,
        testimonio TEXT NOT NULL,
        imagen_url TEXT,
        activo BOOLEAN NOT NULL DEFAULT 1,
        orden INTEGER NOT NULL DEFAULT 0,
        calificacion INTEGER NOT NULL DEFAULT 5,
        proyecto_relacionado TEXT,
        fecha_creacion TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blog_post (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        titulo TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        contenido TEXT NOT NULL,
        resumen TEXT,
        imagen_url TEXT,
        categoria TEXT,
        tags TEXT,
        publicado BOOLEAN NOT NULL DEFAULT 0,
        fecha_creacion TEXT NOT NULL,
        fecha_publicacion TEXT,
        fecha_actualizacion TEXT NOT NULL,
        vistas INTEGER NOT NULL DEFAULT 0,
        autor TEXT NOT NULL,
        tiempo_lectura INTEGER
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_blog_post_publicado ON blog_post(publicado, fecha_publicacion DESC)",
];

/// Creates every table and index that does not exist yet.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!("Database migrations completed");
    Ok(())
}

/// In-memory database with the schema applied, for tests.
///
/// A single connection is kept alive for the pool's lifetime since every
/// SQLite `:memory:` connection owns a separate database.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    run_migrations(&pool).await.expect("schema");
    pool
}
