//! Domain models for prenatal records.

mod consultation;
mod exam;
mod patient;
mod pending;

pub use consultation::*;
pub use exam::*;
pub use patient::*;
pub use pending::*;
