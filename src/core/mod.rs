//! Core business logic - framework-agnostic admission, numbering and fee operations.

pub mod admission;
pub mod admission_number;
pub mod bulk_delete;
pub mod fee_calculator;
pub mod fee_structure;
pub mod repair;
pub mod school;
pub mod session;
