//! Domain model: task records and machine-suggested candidates.

pub mod suggestion;
pub mod task;
