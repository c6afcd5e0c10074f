//! Resource models with behavior beyond generic CRUD. Users and stars go through `CrudService` directly.

pub mod compound;
pub mod planet;
pub mod planetary_system;
