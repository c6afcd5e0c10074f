//! Resource CRUD handlers: list, create, read, update (PUT), patch, delete.

use crate::config::{resource_by_path, ResourceDef, PLANETARY_SYSTEMS, PLANETS};
use crate::error::AppError;
use crate::models::{planet, planetary_system};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{parse_filters, CrudService, RequestValidator};
use crate::sql::{BindValue, QueryOptions};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Query keys with a fixed meaning; every other key is a raw filter.
const RESERVED_PARAMS: &[&str] = &["page", "limit", "sort", "search"];

fn resolve(path_segment: &str) -> Result<&'static ResourceDef, AppError> {
    resource_by_path(path_segment).ok_or_else(|| AppError::NotFound(path_segment.to_string()))
}

fn is(resource: &ResourceDef, other: &ResourceDef) -> bool {
    std::ptr::eq(resource, other)
}

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    match id_str.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::BadRequest(format!("invalid id: {}", id_str))),
    }
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn parse_number(key: &str, raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be an integer", key)))
}

/// Build list options from query parameters. `limit` is capped at `max_page_size`.
pub fn list_options(
    resource: &ResourceDef,
    params: &HashMap<String, String>,
    max_page_size: u32,
) -> Result<QueryOptions, AppError> {
    let page = params.get("page").map(|v| parse_number("page", v)).transpose()?;
    let limit = params
        .get("limit")
        .map(|v| parse_number("limit", v))
        .transpose()?
        .map(|n| n.min(i64::from(max_page_size)));
    let raw_filters: HashMap<String, String> = params
        .iter()
        .filter(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(QueryOptions {
        page,
        limit,
        sort: params.get("sort").cloned(),
        search: params.get("search").cloned(),
        filters: parse_filters(&raw_filters, resource.filter_parsers)?,
    })
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resolve(&path_segment)?;
    let options = list_options(resource, &params, state.settings.max_page_size)?;
    let page = CrudService::list(&state.pool, resource, &options).await?;
    let paged = options.page.is_some() && options.limit.is_some();
    Ok(success_many(
        page.rows,
        page.total,
        options.page.filter(|_| paged).map(|p| p.max(1)),
        options.limit.filter(|_| paged).map(|l| l.max(1)),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resolve(&path_segment)?;
    let body = body_to_map(body)?;
    let row = if is(resource, &PLANETS) {
        planet::create(&state.pool, &body).await?
    } else {
        let fields = RequestValidator::validate(resource, &body)?;
        CrudService::create(&state.pool, resource, &fields).await?
    };
    Ok(success_one(row))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resolve(&path_segment)?;
    let id = parse_id(&id_str)?;
    let row = if is(resource, &PLANETS) {
        planet::get_by_id(&state.pool, id).await?
    } else if is(resource, &PLANETARY_SYSTEMS) {
        planetary_system::get_by_id(&state.pool, id).await?
    } else {
        CrudService::read(&state.pool, resource, &BindValue::I64(id)).await?
    };
    let row = row.ok_or_else(|| AppError::NotFound(format!("{} {}", path_segment, id_str)))?;
    Ok(success_one_ok(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    write(state, &path_segment, &id_str, body, false).await
}

pub async fn patch(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    write(state, &path_segment, &id_str, body, true).await
}

async fn write(
    state: AppState,
    path_segment: &str,
    id_str: &str,
    body: Value,
    partial: bool,
) -> Result<impl IntoResponse, AppError> {
    let resource = resolve(path_segment)?;
    let id = parse_id(id_str)?;
    let body = body_to_map(body)?;
    let row = if is(resource, &PLANETS) {
        if partial {
            planet::patch(&state.pool, id, &body).await?
        } else {
            planet::update(&state.pool, id, &body).await?
        }
    } else {
        let fields = if partial {
            RequestValidator::validate_partial(resource, &body)?
        } else {
            RequestValidator::validate(resource, &body)?
        };
        CrudService::update(&state.pool, resource, &BindValue::I64(id), &fields).await?
    };
    let row = row.ok_or_else(|| AppError::NotFound(format!("{} {}", path_segment, id_str)))?;
    Ok(success_one_ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resolve(&path_segment)?;
    let id = parse_id(&id_str)?;
    let row = if is(resource, &PLANETS) {
        planet::delete(&state.pool, id).await?
    } else if is(resource, &PLANETARY_SYSTEMS) {
        planetary_system::delete(&state.pool, id).await?
    } else {
        CrudService::delete(&state.pool, resource, &BindValue::I64(id)).await?
    };
    if row.is_none() {
        return Err(AppError::NotFound(format!("{} {}", path_segment, id_str)));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STARS;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let p = params(&[("page", "2"), ("limit", "500"), ("sort", "-name"), ("system_id", "3"), ("bogus", "1")]);
        let o = list_options(&STARS, &p, 100).unwrap();
        assert_eq!(o.page, Some(2));
        assert_eq!(o.limit, Some(100));
        assert_eq!(o.sort.as_deref(), Some("-name"));
        assert_eq!(o.filters.len(), 1);
        assert_eq!(o.filters["system_id"], BindValue::I64(3));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(list_options(&STARS, &params(&[("page", "two")]), 100).is_err());
        assert!(matches!(
            list_options(&STARS, &params(&[("system_id", "sol")]), 100),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("abc").is_err());
    }
}
