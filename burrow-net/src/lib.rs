//! Network wiring for isolated processes
//!
//! Three pieces, two execution contexts:
//! - [`wirer::BridgeWirer`] runs on the host, concurrently with the
//!   child's startup: veth pair creation, bridge attachment, and the
//!   one-way move of the peer into the child's network namespace
//! - [`wait::NetworkWait`] runs inside the namespace: the bounded poll
//!   until the moved link becomes visible
//! - [`configure::NetworkConfigurator`] runs inside the namespace:
//!   address, link activation, and the default route
//!
//! All link/address/route manipulation goes through rtnetlink; nothing
//! shells out to `ip`.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod link;

pub mod configure;
pub mod wait;
pub mod wirer;

pub use configure::NetworkConfigurator;
pub use wait::{InterfaceLister, NetworkWait, SysfsLister};
pub use wirer::BridgeWirer;
