//! Shared test utilities for the Password Safe client crates.
//!
//! This crate provides:
//! - A `wiremock` server speaking the Password Safe API
//! - Proptest generators for names and paths
//! - JSON fixtures for API responses

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::{API_PATH, MockPasswordSafe};
