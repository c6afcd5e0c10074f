//! Request body validation against a resource's column definitions.

use crate::config::{ColumnDef, ResourceDef};
use crate::error::AppError;
use crate::sql::BindValue;
use regex::Regex;
use serde_json::{Map, Value};

/// Validated column values in column-definition order, ready for INSERT or SET.
pub type ColumnValues = Vec<(&'static str, BindValue)>;

pub struct RequestValidator;

impl RequestValidator {
    /// All required columns must be present and non-null. Unknown and read-only keys are ignored.
    pub fn validate(resource: &ResourceDef, body: &Map<String, Value>) -> Result<ColumnValues, AppError> {
        let mut out = Vec::new();
        for col in resource.writable_columns() {
            match body.get(col.name) {
                None | Some(Value::Null) if col.required => {
                    return Err(AppError::Validation(format!("{} is required", col.name)));
                }
                None => {}
                Some(v) => out.push((col.name, validate_field(col, v)?)),
            }
        }
        Ok(out)
    }

    /// Only the columns present in body (PATCH). Non-nullable columns still cannot be cleared.
    pub fn validate_partial(resource: &ResourceDef, body: &Map<String, Value>) -> Result<ColumnValues, AppError> {
        let mut out = Vec::new();
        for col in resource.writable_columns() {
            let Some(v) = body.get(col.name) else { continue };
            out.push((col.name, validate_field(col, v)?));
        }
        Ok(out)
    }
}

fn validate_field(col: &ColumnDef, v: &Value) -> Result<BindValue, AppError> {
    if !col.nullable && v.is_null() {
        return Err(AppError::Validation(format!("{} cannot be null", col.name)));
    }
    let bound = BindValue::for_column(col.name, col.kind, v)?;
    if let (Some(pattern), BindValue::Text(s)) = (col.pattern, &bound) {
        let re = Regex::new(pattern).map_err(|_| AppError::Config(format!("invalid pattern for {}", col.name)))?;
        if !re.is_match(s) {
            return Err(AppError::Validation(format!("{} does not match required pattern", col.name)));
        }
    }
    Ok(bound)
}
