//! Catalog schema DDL and database bootstrap.

use crate::error::AppError;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Tables in dependency order. Children reference parents without cascades; deletes are explicit.
pub(crate) const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        display_name TEXT,
        role TEXT NOT NULL DEFAULT 'explorer',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS planetary_systems (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        owner_id BIGINT NOT NULL REFERENCES users (id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stars (
        id BIGSERIAL PRIMARY KEY,
        system_id BIGINT NOT NULL REFERENCES planetary_systems (id),
        name TEXT NOT NULL,
        spectral_type TEXT NOT NULL,
        mass_solar DOUBLE PRECISION,
        radius_solar DOUBLE PRECISION,
        temperature_k DOUBLE PRECISION,
        luminosity_solar DOUBLE PRECISION,
        texture_url TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS planets (
        id BIGSERIAL PRIMARY KEY,
        system_id BIGINT NOT NULL REFERENCES planetary_systems (id),
        name TEXT NOT NULL,
        planet_type TEXT NOT NULL,
        radius_km DOUBLE PRECISION NOT NULL,
        mass_earth DOUBLE PRECISION,
        orbital_period_days DOUBLE PRECISION,
        semi_major_axis_au DOUBLE PRECISION,
        texture_url TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (system_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS compounds (
        cid BIGINT PRIMARY KEY,
        name TEXT,
        formula TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS planet_compounds (
        planet_id BIGINT NOT NULL REFERENCES planets (id),
        cid BIGINT NOT NULL REFERENCES compounds (cid),
        percentage DOUBLE PRECISION NOT NULL CHECK (percentage >= 0 AND percentage <= 100),
        PRIMARY KEY (planet_id, cid)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS atmospheres (
        planet_id BIGINT PRIMARY KEY REFERENCES planets (id),
        pressure_atm DOUBLE PRECISION NOT NULL,
        greenhouse_factor DOUBLE PRECISION NOT NULL,
        texture_url TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS atmosphere_compounds (
        planet_id BIGINT NOT NULL REFERENCES atmospheres (planet_id),
        cid BIGINT NOT NULL REFERENCES compounds (cid),
        percentage DOUBLE PRECISION NOT NULL CHECK (percentage >= 0 AND percentage <= 100),
        PRIMARY KEY (planet_id, cid)
    )
    "#,
];

/// Create every catalog table that does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(tables = SCHEMA.len(), "schema ready");
    Ok(())
}

/// Connect to the `postgres` database on the same server and create the target database if missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Config(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await.map_err(AppError::Db)?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await
        .map_err(AppError::Db)?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(AppError::Db)?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::Config("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
