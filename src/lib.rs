//! IP intelligence lookups.
//!
//! Resolves an address (or the caller's own) through a cascade of
//! geolocation providers, scores it with a simple risk heuristic, keeps a
//! capped lookup history, and optionally asks a language model for a
//! narrative summary.

pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
