//! Core types and backend API client for the Berez fountain finder.
//!
//! The wire types mirror the JSON the Berez backend serves. The collaborator
//! traits in [`source`] are what the engine in `berez-state` talks to; the
//! `reqwest` implementations live behind the `api` feature so the core types
//! stay usable without a network stack.

pub mod error;
pub mod fountain;
pub mod location;
pub mod review;
pub mod source;

#[cfg(feature = "api")]
pub mod client;
#[cfg(feature = "api")]
pub mod ip;
