//! Static resource definitions: columns, query allow-lists and filter parsers.

pub mod catalog;
pub mod resource;

pub use catalog::*;
pub use resource::*;
