//! Lead Flow — client-side orchestration of the list-builder job.

pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod phase;
pub mod usage;
pub mod validate;
pub mod view;
