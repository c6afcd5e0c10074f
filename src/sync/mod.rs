//! Nested-resource synchronizer for planets: compound list and optional atmosphere.

mod patch;
mod planet;
mod store;
mod types;

pub use patch::Patch;
pub use planet::{apply_planet_patch, update_planet_atmosphere, update_planet_compounds, PlanetPatch};
pub use store::SyncStore;
pub use types::{validate_composition, AtmospherePatch, Compound, CompoundLink, CompoundShare, NewAtmosphere};
