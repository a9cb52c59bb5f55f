//! Shared runtime helpers for the ace host crates: logging setup and
//! data directory preparation.

pub mod env;
pub mod utils;
