//! Core hub types.

mod builder;
mod handler;
mod hub;
mod registration;

pub use builder::HubBuilder;
pub use handler::{Handler, HandlerOutcome, HandlerResult};
pub use hub::Hub;
