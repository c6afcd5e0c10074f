//! Reconciles a planet's compound list and atmosphere against a partial payload.
//!
//! All functions run on a caller-owned transaction; errors propagate so the caller rolls back.

use super::patch::Patch;
use super::store::SyncStore;
use super::types::{validate_composition, AtmospherePatch, CompoundLink, CompoundShare};
use crate::error::AppError;
use crate::sql::BindValue;

/// Parent-row changes plus nested aggregates for one planet write.
#[derive(Clone, Debug, Default)]
pub struct PlanetPatch {
    /// Planet columns to SET, already validated.
    pub fields: Vec<(&'static str, BindValue)>,
    /// `None` leaves the composition alone; `Some` replaces it.
    pub compounds: Option<Vec<CompoundShare>>,
    pub atmosphere: Patch<AtmospherePatch>,
}

impl PlanetPatch {
    /// Payload checks that need no database access.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(c) = &self.compounds {
            validate_composition(c)?;
        }
        if let Patch::Set(a) = &self.atmosphere {
            a.validate()?;
        }
        Ok(())
    }
}

/// Update the planet row, then its compounds, then its atmosphere.
pub async fn apply_planet_patch<S>(store: &mut S, planet_id: i64, patch: &PlanetPatch) -> Result<(), AppError>
where
    S: SyncStore + ?Sized,
{
    patch.validate()?;
    if !store.update_planet(planet_id, &patch.fields).await? {
        return Err(AppError::NotFound(format!("planet {}", planet_id)));
    }
    update_planet_compounds(store, planet_id, patch.compounds.as_deref()).await?;
    update_planet_atmosphere(store, planet_id, &patch.atmosphere).await
}

/// `None`: no-op. `Some(list)`: delete every association, then insert `list` (ensuring each compound exists).
pub async fn update_planet_compounds<S>(
    store: &mut S,
    planet_id: i64,
    compounds: Option<&[CompoundShare]>,
) -> Result<(), AppError>
where
    S: SyncStore + ?Sized,
{
    let Some(compounds) = compounds else {
        return Ok(());
    };
    replace_compound_links(store, CompoundLink::Planet, planet_id, compounds).await
}

/// `Unset`: no-op. `Clear`: delete the atmosphere and its compounds. `Set`: update present fields,
/// or create when no atmosphere exists (all of pressure_atm, greenhouse_factor, texture_url required).
pub async fn update_planet_atmosphere<S>(
    store: &mut S,
    planet_id: i64,
    atmosphere: &Patch<AtmospherePatch>,
) -> Result<(), AppError>
where
    S: SyncStore + ?Sized,
{
    match atmosphere {
        Patch::Unset => Ok(()),
        Patch::Clear => {
            tracing::debug!(planet_id, "deleting atmosphere");
            store.delete_compound_links(CompoundLink::Atmosphere, planet_id).await?;
            store.delete_atmosphere(planet_id).await?;
            Ok(())
        }
        Patch::Set(patch) => {
            patch.validate()?;
            if store.atmosphere_exists(planet_id).await? {
                tracing::debug!(planet_id, "updating atmosphere");
                store.update_atmosphere(planet_id, &patch.column_updates()).await?;
            } else {
                let Some(new) = patch.complete() else {
                    return Err(AppError::Validation(
                        "cannot create partial atmosphere: pressure_atm, greenhouse_factor and texture_url are required"
                            .into(),
                    ));
                };
                tracing::debug!(planet_id, "creating atmosphere");
                store.insert_atmosphere(planet_id, &new).await?;
            }
            if let Some(compounds) = &patch.compounds {
                replace_compound_links(store, CompoundLink::Atmosphere, planet_id, compounds).await?;
            }
            Ok(())
        }
    }
}

async fn replace_compound_links<S>(
    store: &mut S,
    link: CompoundLink,
    planet_id: i64,
    compounds: &[CompoundShare],
) -> Result<(), AppError>
where
    S: SyncStore + ?Sized,
{
    validate_composition(compounds)?;
    tracing::debug!(planet_id, table = link.table(), count = compounds.len(), "replacing compounds");
    store.delete_compound_links(link, planet_id).await?;
    for share in compounds {
        store.ensure_compound(share.cid).await?;
        store.insert_compound_link(link, planet_id, share).await?;
    }
    Ok(())
}
