//! Safe SQL building: identifiers from static config only, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
