//! Raw query-string filters into typed bind values.

use crate::config::FilterParser;
use crate::error::AppError;
use crate::sql::{BindValue, Filters};
use std::collections::HashMap;

/// Parse every field that has a parser and a raw value. Fields without a parser are dropped.
pub fn parse_filters(raw: &HashMap<String, String>, parsers: &[(&str, FilterParser)]) -> Result<Filters, AppError> {
    let mut out = Filters::new();
    for (field, parser) in parsers {
        let Some(value) = raw.get(*field) else { continue };
        let parsed = parse_value(value, *parser)
            .ok_or_else(|| AppError::Validation(format!("invalid value for filter '{}': {:?}", field, value)))?;
        out.insert(field.to_string(), parsed);
    }
    Ok(out)
}

fn parse_value(raw: &str, parser: FilterParser) -> Option<BindValue> {
    match parser {
        FilterParser::Text => Some(BindValue::Text(raw.to_string())),
        FilterParser::Integer => raw.trim().parse::<i64>().ok().map(BindValue::I64),
        FilterParser::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| !f.is_nan())
            .map(BindValue::F64),
        FilterParser::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(BindValue::Bool(true)),
            "false" | "0" => Some(BindValue::Bool(false)),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parses_declared_fields_and_drops_the_rest() {
        let parsers = [("system_id", FilterParser::Integer), ("planet_type", FilterParser::Text)];
        let f = parse_filters(&raw(&[("system_id", " 7"), ("planet_type", "gas"), ("owner", "1")]), &parsers).unwrap();
        assert_eq!(f.len(), 2);
        assert_eq!(f["system_id"], BindValue::I64(7));
        assert_eq!(f["planet_type"], BindValue::Text("gas".into()));
    }

    #[test]
    fn bad_number_names_the_field() {
        let parsers = [("system_id", FilterParser::Integer)];
        let err = parse_filters(&raw(&[("system_id", "seven")]), &parsers).unwrap_err();
        assert!(matches!(&err, AppError::Validation(m) if m.contains("system_id")));
    }

    #[test]
    fn nan_is_rejected() {
        let parsers = [("mass", FilterParser::Float)];
        assert!(parse_filters(&raw(&[("mass", "NaN")]), &parsers).is_err());
        assert_eq!(parse_filters(&raw(&[("mass", "1.5")]), &parsers).unwrap()["mass"], BindValue::F64(1.5));
    }

    #[test]
    fn booleans() {
        let parsers = [("active", FilterParser::Bool)];
        assert_eq!(parse_filters(&raw(&[("active", "TRUE")]), &parsers).unwrap()["active"], BindValue::Bool(true));
        assert!(parse_filters(&raw(&[("active", "yes")]), &parsers).is_err());
    }
}
