//! Entity module - Contains all SeaORM entity definitions for the store.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod admission;
pub mod admission_counter;
pub mod fee_structure;
pub mod school;

// Re-export specific types to avoid conflicts
pub use admission::{
    AdmissionStatus, Column as AdmissionColumn, Entity as Admission, Model as AdmissionModel,
};
pub use admission_counter::{
    Column as AdmissionCounterColumn, Entity as AdmissionCounter, Model as AdmissionCounterModel,
};
pub use fee_structure::{
    Column as FeeStructureColumn, Entity as FeeStructure, Model as FeeStructureModel,
};
pub use school::{Column as SchoolColumn, Entity as School, Model as SchoolModel};
