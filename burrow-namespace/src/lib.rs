//! Namespace creation and the two-phase isolated-process launch
//!
//! This crate provides:
//! - Namespace selection mapped onto `clone(2)` flags
//! - UID/GID mappings for the user namespace
//! - The `Launcher`, which clones the child, writes its identity maps,
//!   and re-executes the runtime binary inside the new namespaces
//! - The root filesystem pivot
//! - One-shot pipe signals ordering the host side against the child side

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod config;
pub mod inspect;
pub mod launcher;
pub mod rootfs;
pub mod sync;

pub use config::{IdMapping, NamespaceConfig};
pub use inspect::NamespaceReport;
pub use launcher::{IsolatedChild, IsolationRequest, Launcher};
pub use sync::{SignalReceiver, SyncPipe, WiringStatus};
