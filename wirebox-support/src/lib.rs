//! # Wirebox Support
//!
//! Shared utilities for the Wirebox DI crates.
//!
//! This crate provides:
//! - Text rendering for error messages (resolution chains, type names)
//! - Fuzzy "did you mean?" matching over registered token labels

pub mod rendering;
