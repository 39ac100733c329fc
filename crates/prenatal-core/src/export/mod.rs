//! Dashboard and chart exports.

mod charts;
mod summary;

pub use charts::*;
pub use summary::*;
