//! Burrow Core - Foundation types and errors
//!
//! This crate provides the abstractions shared by the launcher, the
//! namespace layer, and the network layer.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{LinkName, NetworkConfig, ProcessId};
