//! Language-specific entity detectors
//!
//! Each detector turns a tree-sitter syntax tree into entities of the
//! language-neutral model in [`crate::schema`]. Only the detector knows the
//! grammar; everything downstream works on entities and references.
//!
//! - `java`: Java classes, interfaces, enums and records
//! - `common`: node helpers shared by detectors

pub mod common;
pub mod java;
