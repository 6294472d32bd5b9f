//! Shared fixtures for unit tests: source types, their registrations and live instances.
//!
//! - [`EmployeeTypes`] / [`EmployeeModel`]: property-heavy record with change notification
//! - [`Calculator`]: overloaded methods and a failing member
//! - [`StringRepository`]: implementation of a closed generic interface



pub use calculator::{Calculator, StringRepository};
pub use employee::{EmployeeModel, EmployeeTypes};
