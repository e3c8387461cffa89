//! Command implementations.

pub mod fix;
pub mod report;
pub mod validate;
