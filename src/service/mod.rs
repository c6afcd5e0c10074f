//! CrudService: generic CRUD using the safe SQL builder, plus filter parsing and body validation.

mod crud;
mod filters;
mod validation;
pub use crud::{CrudService, Page};
pub(crate) use crud::{execute, fetch_all, fetch_count, fetch_optional};
pub use filters::parse_filters;
pub use validation::{ColumnValues, RequestValidator};
