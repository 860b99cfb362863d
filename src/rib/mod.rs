//! The RIBs and the plumbing between them.
//!
//! An [AdjRibIn] holds the paths received from one peer, runs them through
//! a filter chain, and passes on what the chain accepts. A [LocRib] holds
//! the paths of all sources and selects the best ones. An [AdjRibOut]
//! holds the paths to be sent to one peer. Each RIB passes every change on
//! to its registered [RouteTableClient]s, and each is a client itself, so
//! RIBs can be chained.
//!
//! A [Vrf] groups the local RIBs of a routing instance, and the
//! [VrfRegistry] holds the VRFs of an application.

mod adj_rib_in;
mod adj_rib_out;
mod client;
mod client_manager;
mod contributing_asns;
mod core;
mod loc_rib;
mod path_id_manager;
mod peer;

pub mod config;
pub mod vrf;

pub use adj_rib_in::AdjRibIn;
pub use adj_rib_out::AdjRibOut;
pub use client::RouteTableClient;
pub use contributing_asns::ContributingAsns;
pub use loc_rib::LocRib;
pub use peer::{should_propagate, PeerInfo};
pub use vrf::{
    parse_route_distinguisher, route_distinguisher_to_string, Vrf,
    VrfRegistry,
};
