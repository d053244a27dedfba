//! Application layer: the two engines built on the domain ports.
//!
//! `capture` and `audited_repository` turn entity writes into audit records.
//! `reminders` and `queue` run the scheduled reminder batch. The engines do
//! not depend on each other.

pub mod audited_repository;
pub mod capture;
pub mod queue;
pub mod reminders;
pub mod request_context;
