//! Planetary systems: detail view with stars and planets, cascading delete in one transaction.

use super::planet::clear_children;
use crate::config::{PLANETARY_SYSTEMS, PLANETS, STARS};
use crate::error::AppError;
use crate::service::{execute, fetch_all, CrudService};
use crate::sql::BindValue;
use serde_json::Value;
use sqlx::PgPool;

pub async fn get_by_id(pool: &PgPool, system_id: i64) -> Result<Option<Value>, AppError> {
    let id = BindValue::I64(system_id);
    let Some(mut system) = CrudService::read(pool, &PLANETARY_SYSTEMS, &id).await? else {
        return Ok(None);
    };
    let stars = fetch_all(
        pool,
        &format!("SELECT {} FROM {} WHERE system_id = $1 ORDER BY id", STARS.select_list(), STARS.table),
        std::slice::from_ref(&id),
    )
    .await?;
    let planets = fetch_all(
        pool,
        &format!(
            "SELECT {} FROM {} WHERE system_id = $1 ORDER BY semi_major_axis_au NULLS LAST, id",
            PLANETS.select_list(),
            PLANETS.table
        ),
        std::slice::from_ref(&id),
    )
    .await?;
    if let Value::Object(m) = &mut system {
        m.insert("stars".into(), Value::Array(stars));
        m.insert("planets".into(), Value::Array(planets));
    }
    Ok(Some(system))
}

/// Delete the system with its stars, planets and every planet's compounds and atmosphere.
pub async fn delete(pool: &PgPool, system_id: i64) -> Result<Option<Value>, AppError> {
    let id = BindValue::I64(system_id);
    let mut tx = pool.begin().await?;
    let planet_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM planets WHERE system_id = $1")
        .bind(system_id)
        .fetch_all(&mut *tx)
        .await?;
    for planet_id in &planet_ids {
        clear_children(&mut *tx, *planet_id).await?;
    }
    execute(&mut *tx, "DELETE FROM planets WHERE system_id = $1", std::slice::from_ref(&id)).await?;
    execute(&mut *tx, "DELETE FROM stars WHERE system_id = $1", std::slice::from_ref(&id)).await?;
    let row = CrudService::delete(&mut *tx, &PLANETARY_SYSTEMS, &id).await?;
    if row.is_some() {
        tx.commit().await?;
        tracing::info!(system_id, planets = planet_ids.len(), "planetary system deleted");
    }
    Ok(row)
}
