//! Flow orchestration — the controller and its poller.

pub mod controller;
pub mod poller;

pub use controller::FlowController;
pub use poller::{FlowEvent, PollKind, Poller};
