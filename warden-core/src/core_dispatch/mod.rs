//! Dispatch layer
//!
//! The operation feed, the keyed dispatcher, and the engine that wires
//! every moderation service onto it.

pub mod dispatcher;
pub mod engine;

#[cfg(test)]
pub mod tests;

pub use dispatcher::OperationDispatcher;
pub use engine::Engine;
