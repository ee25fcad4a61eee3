/**
 * Server Configuration
 *
 * Configuration is read from environment variables once at startup.
 * The database and the token secret are mandatory; everything else has
 * a local-development default.
 */

use sqlx::PgPool;
use std::path::PathBuf;

/// Immutable runtime configuration shared through `AppState`
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP listener binds to (`SERVER_PORT`, default 3000)
    pub port: u16,
    /// Shared secret used to verify bearer tokens (`JWT_SECRET`)
    pub jwt_secret: String,
    /// Directory uploaded files are stored under (`UPLOAD_DIR`, default `uploads`)
    pub upload_dir: PathBuf,
    /// Origin allowed by CORS (`CLIENT_URL`, default `http://localhost:5173`)
    pub client_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let port = std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| "SERVER_PORT must be a valid port number".to_string())?;

        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;
        if jwt_secret.is_empty() {
            return Err("JWT_SECRET must not be empty".to_string());
        }

        let upload_dir = PathBuf::from(
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
        );
        let client_url =
            std::env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        Ok(Self { port, jwt_secret, upload_dir, client_url })
    }
}

/// Connect to the database and run migrations
///
/// Unlike optional services, the store is mandatory: a missing
/// `DATABASE_URL` or a failed connection aborts startup.
pub async fn load_database() -> Result<PgPool, String> {
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

    tracing::info!("connecting to database");
    let pool = PgPool::connect(&database_url)
        .await
        .map_err(|e| format!("failed to create database connection pool: {e}"))?;

    tracing::info!("running database migrations");
    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| format!("failed to run database migrations: {e}"))?;

    Ok(pool)
}
