//! Google consent flow for the user-delegated mode

pub mod public;
mod router;

pub use router::router;
