#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

//! A library that provides the Routing Information Bases (RIBs) of a
//! router: the tables holding the paths learned for each prefix, the
//! selection of the best paths, and the propagation of changes to the
//! consumers of a table.
//!
//! The routes of a RIB are kept in a binary prefix trie per address
//! family, supporting exact, longest-prefix, and more-specific lookups.
//! Withdrawn routes leave an inactive node in the trie, that is reused
//! when the prefix is announced again.
//!
//! Paths of different protocols (static, BGP, OSPF, IS-IS, and kernel
//! routes) can live in the same route. The selection orders them by
//! protocol preference first, and by the rules of the protocol second.
//!
//! Two flavours of RIB build on the trie: the received RIB of a single
//! peer ([rib::AdjRibIn]), that applies import policy ([filter]), and the
//! local RIB ([rib::LocRib]) that holds the paths of all sources. Every
//! change is sent to the registered clients as a minimal set of
//! withdrawals and advertisements.
mod trie;
mod types;

// re-exports
pub use inetnum::addr;

// Public Interfaces on the root of the crate

/// RIBs, their clients, and the VRFs grouping them
pub mod rib;

/// Routes, paths and the best path selection
pub mod route;

/// Import policy
pub mod filter;

/// Types used to create match queries on a RIB
pub use types::match_options;

/// Error types returned by a RIB
pub use types::errors;

/// Trait that defines the AFIs 1 (IPv4) and 2 (IPv6)
pub use types::af::AddressFamily;

/// The underlying value (u32) and trait impl for AFI 1.
pub use types::af::IPv4;
/// The underlying value (u128) and trait impl for AFI 2.
pub use types::af::IPv6;

/// The table of routes for both address families
pub use trie::table::RoutingTable;

/// Statistics returned by methods on a RIB
pub use types::stats;

// Used in tests
#[doc(hidden)]
pub use types::test_types;
