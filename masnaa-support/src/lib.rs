//! # Masnaa Support
//!
//! Shared utilities for the Masnaa factory resolution crates.
//!
//! This crate provides:
//! - Text rendering for error messages and pass reports

pub mod rendering;
