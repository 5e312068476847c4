//! Common test utilities and fixtures for depsight-engine integration tests
//!
//! This module provides:
//! - `TestRepo` builder for creating Java projects on disk
//! - Model builders and assertions for analysis results

#![allow(dead_code)]

pub mod assertions;
pub mod test_repo;

pub use assertions::*;
pub use test_repo::TestRepo;
