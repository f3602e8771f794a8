//! `sr-domain` holds the types shared by every SessionRelay crate: the error type,
//! structured trace events, and the configuration tree.

pub mod config;
pub mod error;
pub mod trace;
