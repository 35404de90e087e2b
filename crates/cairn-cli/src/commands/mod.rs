//! CLI command implementations for Cairn.

pub mod check;
pub mod replay;
