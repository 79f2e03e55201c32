// src/utils/mod.rs
//! Helper functions.

pub mod crypto;
pub mod serialization;
