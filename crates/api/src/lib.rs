//! Media agency action engine and its HTTP surface.
//!
//! The engine turns an `(intention, params)` pair into one domain operation
//! and a uniform [`Envelope`](envelope::Envelope). The library exposes the
//! registry, dispatcher, handlers, config and router so integration tests
//! and the binary entrypoint share them.

pub mod config;
pub mod engine;
pub mod envelope;
pub mod handlers;
pub mod params;
pub mod router;
pub mod routes;
pub mod state;
