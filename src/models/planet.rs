//! Planets: parent row plus compound list and atmosphere, always written in one transaction.

use crate::config::PLANETS;
use crate::error::AppError;
use crate::service::{fetch_all, fetch_optional, CrudService, RequestValidator};
use crate::sql::BindValue;
use crate::sync::{
    apply_planet_patch, update_planet_atmosphere, update_planet_compounds, AtmospherePatch, CompoundShare, Patch,
    PlanetPatch,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool};

/// How strictly planet columns in a body are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// POST and PUT: required columns must be present.
    Full,
    /// PATCH: only present columns are applied.
    Partial,
}

#[derive(Deserialize)]
struct NestedBody {
    #[serde(default)]
    compounds: Option<Vec<CompoundShare>>,
    #[serde(default)]
    atmosphere: Patch<AtmospherePatch>,
}

/// Split a request body into validated planet columns and the nested aggregates.
pub fn planet_patch_from_body(body: &Map<String, Value>, mode: WriteMode) -> Result<PlanetPatch, AppError> {
    let fields = match mode {
        WriteMode::Full => RequestValidator::validate(&PLANETS, body)?,
        WriteMode::Partial => RequestValidator::validate_partial(&PLANETS, body)?,
    };
    let nested: NestedBody = serde_json::from_value(Value::Object(body.clone()))
        .map_err(|e| AppError::Validation(format!("invalid compounds or atmosphere: {}", e)))?;
    let patch = PlanetPatch {
        fields,
        compounds: nested.compounds,
        atmosphere: nested.atmosphere,
    };
    patch.validate()?;
    Ok(patch)
}

pub async fn create(pool: &PgPool, body: &Map<String, Value>) -> Result<Value, AppError> {
    let patch = planet_patch_from_body(body, WriteMode::Full)?;
    let mut tx = pool.begin().await?;
    let row = CrudService::create(&mut *tx, &PLANETS, &patch.fields).await?;
    let planet_id = row
        .get(PLANETS.pk)
        .and_then(Value::as_i64)
        .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))?;
    update_planet_compounds(&mut *tx, planet_id, patch.compounds.as_deref()).await?;
    update_planet_atmosphere(&mut *tx, planet_id, &patch.atmosphere).await?;
    tx.commit().await?;
    tracing::info!(planet_id, "planet created");
    get_by_id(pool, planet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("planet {}", planet_id)))
}

/// PUT: every required column must be supplied; nested aggregates keep their tri-state meaning.
pub async fn update(pool: &PgPool, planet_id: i64, body: &Map<String, Value>) -> Result<Option<Value>, AppError> {
    let patch = planet_patch_from_body(body, WriteMode::Full)?;
    write(pool, planet_id, &patch).await
}

pub async fn patch(pool: &PgPool, planet_id: i64, body: &Map<String, Value>) -> Result<Option<Value>, AppError> {
    let patch = planet_patch_from_body(body, WriteMode::Partial)?;
    write(pool, planet_id, &patch).await
}

async fn write(pool: &PgPool, planet_id: i64, patch: &PlanetPatch) -> Result<Option<Value>, AppError> {
    let mut tx = pool.begin().await?;
    match apply_planet_patch(&mut *tx, planet_id, patch).await {
        Ok(()) => {}
        Err(AppError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    }
    tx.commit().await?;
    get_by_id(pool, planet_id).await
}

/// Planet row with `compounds` and `atmosphere` (or null) attached.
pub async fn get_by_id(pool: &PgPool, planet_id: i64) -> Result<Option<Value>, AppError> {
    let id = BindValue::I64(planet_id);
    let Some(mut planet) = CrudService::read(pool, &PLANETS, &id).await? else {
        return Ok(None);
    };
    let compounds = composition(pool, "planet_compounds", planet_id).await?;
    let atmosphere = fetch_optional(
        pool,
        "SELECT pressure_atm, greenhouse_factor, texture_url FROM atmospheres WHERE planet_id = $1",
        std::slice::from_ref(&id),
    )
    .await?;
    let atmosphere = match atmosphere {
        Some(mut a) => {
            let gases = composition(pool, "atmosphere_compounds", planet_id).await?;
            if let Value::Object(m) = &mut a {
                m.insert("compounds".into(), Value::Array(gases));
            }
            a
        }
        None => Value::Null,
    };
    if let Value::Object(m) = &mut planet {
        m.insert("compounds".into(), Value::Array(compounds));
        m.insert("atmosphere".into(), atmosphere);
    }
    Ok(Some(planet))
}

async fn composition(pool: &PgPool, table: &'static str, planet_id: i64) -> Result<Vec<Value>, AppError> {
    let sql = format!(
        "SELECT c.cid AS \"CID\", c.name, c.formula, l.percentage \
         FROM {} l JOIN compounds c ON c.cid = l.cid \
         WHERE l.planet_id = $1 ORDER BY l.percentage DESC, c.cid",
        table
    );
    fetch_all(pool, &sql, &[BindValue::I64(planet_id)]).await
}

/// Remove the atmosphere and both compositions. Shared with planetary system deletion.
pub(crate) async fn clear_children(conn: &mut PgConnection, planet_id: i64) -> Result<(), AppError> {
    update_planet_atmosphere(&mut *conn, planet_id, &Patch::Clear).await?;
    update_planet_compounds(&mut *conn, planet_id, Some(&[])).await
}

pub async fn delete(pool: &PgPool, planet_id: i64) -> Result<Option<Value>, AppError> {
    let mut tx = pool.begin().await?;
    clear_children(&mut *tx, planet_id).await?;
    let row = CrudService::delete(&mut *tx, &PLANETS, &BindValue::I64(planet_id)).await?;
    if row.is_some() {
        tx.commit().await?;
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn partial_body_keeps_tri_state() {
        let p = planet_patch_from_body(&obj(json!({"name": "Hoth"})), WriteMode::Partial).unwrap();
        assert_eq!(p.fields, vec![("name", BindValue::Text("Hoth".into()))]);
        assert!(p.compounds.is_none());
        assert!(p.atmosphere.is_unset());

        let p = planet_patch_from_body(&obj(json!({"atmosphere": null, "compounds": []})), WriteMode::Partial).unwrap();
        assert_eq!(p.atmosphere, Patch::Clear);
        assert_eq!(p.compounds, Some(vec![]));
    }

    #[test]
    fn nested_payload_is_checked_up_front() {
        let body = obj(json!({"compounds": [{"CID": 1, "percentage": 70}, {"CID": 2, "percentage": 40}]}));
        assert!(matches!(
            planet_patch_from_body(&body, WriteMode::Partial),
            Err(AppError::Validation(_))
        ));
        let body = obj(json!({"atmosphere": {"pressure_atm": "high"}}));
        assert!(planet_patch_from_body(&body, WriteMode::Partial).is_err());
    }

    #[test]
    fn null_atmosphere_column_is_a_validation_error() {
        let body = obj(json!({"atmosphere": {"texture_url": null}}));
        let err = planet_patch_from_body(&body, WriteMode::Partial).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("cannot be null"), "{}", err);
    }

    #[test]
    fn full_mode_requires_planet_columns() {
        let err = planet_patch_from_body(&obj(json!({"atmosphere": null})), WriteMode::Full).unwrap_err();
        assert_eq!(err.to_string(), "validation: system_id is required");
    }
}
