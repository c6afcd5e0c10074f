//! Payload types for a planet's nested compounds and atmosphere.

use crate::error::AppError;
use crate::sql::BindValue;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Tolerance for float rounding when summing percentages.
const PERCENT_EPSILON: f64 = 1e-9;

/// A compound in the reference table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Compound {
    #[serde(rename = "CID")]
    pub cid: i64,
    pub name: Option<String>,
    pub formula: Option<String>,
}

/// One entry of a planet's (or atmosphere's) composition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompoundShare {
    #[serde(rename = "CID")]
    pub cid: i64,
    pub percentage: f64,
}

/// Which association table a composition lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompoundLink {
    Planet,
    Atmosphere,
}

impl CompoundLink {
    pub fn table(self) -> &'static str {
        match self {
            CompoundLink::Planet => "planet_compounds",
            CompoundLink::Atmosphere => "atmosphere_compounds",
        }
    }
}

/// Partial atmosphere payload. Absent fields stay `None` and are not touched on update;
/// an explicit null on a column fails deserialization.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AtmospherePatch {
    #[serde(default, deserialize_with = "present_non_null")]
    pub pressure_atm: Option<f64>,
    #[serde(default, deserialize_with = "present_non_null")]
    pub greenhouse_factor: Option<f64>,
    #[serde(default, deserialize_with = "present_non_null")]
    pub texture_url: Option<String>,
    /// `Some` (even empty) replaces the atmosphere's composition.
    #[serde(default)]
    pub compounds: Option<Vec<CompoundShare>>,
}

/// Only called for keys that are present, so `null` here is an explicit null.
fn present_non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<T>::deserialize(deserializer)? {
        Some(v) => Ok(Some(v)),
        None => Err(de::Error::custom(
            "atmosphere pressure_atm, greenhouse_factor and texture_url cannot be null",
        )),
    }
}

/// A complete atmosphere row, as required for creation.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAtmosphere {
    pub pressure_atm: f64,
    pub greenhouse_factor: f64,
    pub texture_url: String,
}

impl AtmospherePatch {
    /// The full row, if every required field is present.
    pub fn complete(&self) -> Option<NewAtmosphere> {
        Some(NewAtmosphere {
            pressure_atm: self.pressure_atm?,
            greenhouse_factor: self.greenhouse_factor?,
            texture_url: self.texture_url.clone()?,
        })
    }

    /// SET list for the fields present, in a fixed column order.
    pub fn column_updates(&self) -> Vec<(&'static str, BindValue)> {
        let mut out = Vec::new();
        if let Some(p) = self.pressure_atm {
            out.push(("pressure_atm", BindValue::F64(p)));
        }
        if let Some(g) = self.greenhouse_factor {
            out.push(("greenhouse_factor", BindValue::F64(g)));
        }
        if let Some(t) = &self.texture_url {
            out.push(("texture_url", BindValue::Text(t.clone())));
        }
        out
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (name, v) in [("pressure_atm", self.pressure_atm), ("greenhouse_factor", self.greenhouse_factor)] {
            if let Some(v) = v {
                if !v.is_finite() || v < 0.0 {
                    return Err(AppError::Validation(format!("atmosphere {} must be a non-negative number", name)));
                }
            }
        }
        if let Some(c) = &self.compounds {
            validate_composition(c)?;
        }
        Ok(())
    }
}

/// Each percentage in [0, 100], no CID twice, total at most 100.
pub fn validate_composition(shares: &[CompoundShare]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    let mut total = 0.0;
    for s in shares {
        if s.cid <= 0 {
            return Err(AppError::Validation(format!("CID must be positive, got {}", s.cid)));
        }
        if !seen.insert(s.cid) {
            return Err(AppError::Validation(format!("compound {} listed more than once", s.cid)));
        }
        if !s.percentage.is_finite() || !(0.0..=100.0).contains(&s.percentage) {
            return Err(AppError::Validation(format!(
                "percentage for compound {} must be between 0 and 100",
                s.cid
            )));
        }
        total += s.percentage;
    }
    if total > 100.0 + PERCENT_EPSILON {
        return Err(AppError::Validation(format!("compound percentages sum to {}, above 100", total)));
    }
    Ok(())
}
