//! Unit-of-work seam for the synchronizer and its PostgreSQL implementation.
//!
//! Implementations run every call on one open transaction and never commit or roll back.

use super::types::{Compound, CompoundLink, CompoundShare, NewAtmosphere};
use crate::config::PLANETS;
use crate::error::AppError;
use crate::models::compound;
use crate::service::{execute, fetch_count};
use crate::sql::{build_set_clause, number_placeholders, BindValue};
use async_trait::async_trait;
use sqlx::PgConnection;

#[async_trait]
pub trait SyncStore: Send {
    async fn planet_exists(&mut self, planet_id: i64) -> Result<bool, AppError>;

    /// SET the given planet columns. Returns whether a row was updated.
    async fn update_planet(&mut self, planet_id: i64, fields: &[(&'static str, BindValue)]) -> Result<bool, AppError>;

    /// Create-if-missing in the compound reference table. Idempotent.
    async fn ensure_compound(&mut self, cid: i64) -> Result<Compound, AppError>;

    async fn delete_compound_links(&mut self, link: CompoundLink, planet_id: i64) -> Result<u64, AppError>;

    async fn insert_compound_link(
        &mut self,
        link: CompoundLink,
        planet_id: i64,
        share: &CompoundShare,
    ) -> Result<(), AppError>;

    async fn atmosphere_exists(&mut self, planet_id: i64) -> Result<bool, AppError>;

    async fn insert_atmosphere(&mut self, planet_id: i64, atmosphere: &NewAtmosphere) -> Result<(), AppError>;

    async fn update_atmosphere(
        &mut self,
        planet_id: i64,
        fields: &[(&'static str, BindValue)],
    ) -> Result<(), AppError>;

    async fn delete_atmosphere(&mut self, planet_id: i64) -> Result<u64, AppError>;
}

#[async_trait]
impl SyncStore for PgConnection {
    async fn planet_exists(&mut self, planet_id: i64) -> Result<bool, AppError> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", PLANETS.table, PLANETS.pk);
        Ok(fetch_count(&mut *self, &sql, &[BindValue::I64(planet_id)]).await? > 0)
    }

    async fn update_planet(&mut self, planet_id: i64, fields: &[(&'static str, BindValue)]) -> Result<bool, AppError> {
        let set = build_set_clause(fields);
        if set.is_empty() {
            return self.planet_exists(planet_id).await;
        }
        let sql = number_placeholders(&format!("UPDATE {} SET {} WHERE {} = ?", PLANETS.table, set.sql, PLANETS.pk));
        let mut values = set.values;
        values.push(BindValue::I64(planet_id));
        Ok(execute(&mut *self, &sql, &values).await? > 0)
    }

    async fn ensure_compound(&mut self, cid: i64) -> Result<Compound, AppError> {
        compound::ensure(self, cid).await
    }

    async fn delete_compound_links(&mut self, link: CompoundLink, planet_id: i64) -> Result<u64, AppError> {
        let sql = format!("DELETE FROM {} WHERE planet_id = $1", link.table());
        execute(&mut *self, &sql, &[BindValue::I64(planet_id)]).await
    }

    async fn insert_compound_link(
        &mut self,
        link: CompoundLink,
        planet_id: i64,
        share: &CompoundShare,
    ) -> Result<(), AppError> {
        let sql = format!("INSERT INTO {} (planet_id, cid, percentage) VALUES ($1, $2, $3)", link.table());
        let values = [
            BindValue::I64(planet_id),
            BindValue::I64(share.cid),
            BindValue::F64(share.percentage),
        ];
        execute(&mut *self, &sql, &values).await?;
        Ok(())
    }

    async fn atmosphere_exists(&mut self, planet_id: i64) -> Result<bool, AppError> {
        let n = fetch_count(
            &mut *self,
            "SELECT COUNT(*) FROM atmospheres WHERE planet_id = $1",
            &[BindValue::I64(planet_id)],
        )
        .await?;
        Ok(n > 0)
    }

    async fn insert_atmosphere(&mut self, planet_id: i64, atmosphere: &NewAtmosphere) -> Result<(), AppError> {
        let values = [
            BindValue::I64(planet_id),
            BindValue::F64(atmosphere.pressure_atm),
            BindValue::F64(atmosphere.greenhouse_factor),
            BindValue::Text(atmosphere.texture_url.clone()),
        ];
        execute(
            &mut *self,
            "INSERT INTO atmospheres (planet_id, pressure_atm, greenhouse_factor, texture_url) VALUES ($1, $2, $3, $4)",
            &values,
        )
        .await?;
        Ok(())
    }

    async fn update_atmosphere(
        &mut self,
        planet_id: i64,
        fields: &[(&'static str, BindValue)],
    ) -> Result<(), AppError> {
        let set = build_set_clause(fields);
        if set.is_empty() {
            return Ok(());
        }
        let sql = number_placeholders(&format!("UPDATE atmospheres SET {} WHERE planet_id = ?", set.sql));
        let mut values = set.values;
        values.push(BindValue::I64(planet_id));
        execute(&mut *self, &sql, &values).await?;
        Ok(())
    }

    async fn delete_atmosphere(&mut self, planet_id: i64) -> Result<u64, AppError> {
        execute(
            &mut *self,
            "DELETE FROM atmospheres WHERE planet_id = $1",
            &[BindValue::I64(planet_id)],
        )
        .await
    }
}
