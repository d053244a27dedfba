//! Domain layer: lending entities, the audit record, field diffing and the
//! storage and delivery ports the application layer depends on.

pub mod audit;
pub mod diff;
pub mod entity;
pub mod loan;
pub mod money;
pub mod ports;
