//! Core types and pure logic for the Canopy climate-action planner.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the risk-scoring engine, the action model, the priority re-ranking rules
//! and the [`store::ObjectStore`] abstraction that storage backends implement.

pub mod action;
pub mod cache;
pub mod error;
pub mod hazard;
pub mod ranking;
pub mod registry;
pub mod resilience;
pub mod store;

pub use error::{Error, Result};
