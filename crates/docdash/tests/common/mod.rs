//! Shared test utilities for docdash integration tests.
//!
//! This module provides:
//! - `FakeBackend`, an in-memory `TaskApi` with scripted failures and gates
//! - Builders for `Task` records

pub mod builders;
pub mod fake_backend;

pub use builders::*;
pub use fake_backend::{Failure, FakeBackend, Gate, Op};
