//! # xmerge
//!
//! Library surface of the xmerge binary, exposed for integration tests.

pub mod cli;
