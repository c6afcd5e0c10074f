//! Tri-state field for partial updates: absent, explicit null, or a value.

use serde::{Deserialize, Deserializer};

/// `Unset` leaves the target alone, `Clear` deletes it, `Set` creates or updates it.
///
/// Use with `#[serde(default)]` so a missing key deserializes to `Unset` while `null` becomes `Clear`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Unset,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            None => Patch::Clear,
            Some(v) => Patch::Set(v),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default)]
        atmosphere: Patch<u32>,
    }

    #[test]
    fn absent_null_and_value_stay_distinct() {
        let absent: Body = serde_json::from_str("{}").unwrap();
        let null: Body = serde_json::from_str(r#"{"atmosphere": null}"#).unwrap();
        let set: Body = serde_json::from_str(r#"{"atmosphere": 3}"#).unwrap();
        assert_eq!(absent.atmosphere, Patch::Unset);
        assert_eq!(null.atmosphere, Patch::Clear);
        assert_eq!(set.atmosphere, Patch::Set(3));
    }
}
