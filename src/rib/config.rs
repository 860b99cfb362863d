//------------ Config --------------------------------------------------------

//! Configuration options for the RIBs and for the clients registered with
//! them.
//!
//! A RIB is created from a [RibConfig]. A client is registered with a set
//! of [ClientOptions] that decide how many of the paths of a route the
//! client gets to see.
//!
//! ```
//! use rotonda_rib::rib::config::{Afi, ClientOptions, RibConfig};
//! use rotonda_rib::rib::LocRib;
//!
//! let config = RibConfig {
//!     afi: Some(Afi::Ipv4),
//!     ..RibConfig::default()
//! };
//! let loc_rib = LocRib::new(config);
//! assert_eq!(loc_rib.route_count(), 0);
//! assert_eq!(ClientOptions::best().max_paths(4), 1);
//! ```
//!
//! All types in this module can be (de)serialized, so that they can be
//! part of the configuration file of the application.

use serde_derive::{Deserialize, Serialize};

use super::peer::PeerInfo;

//------------ ClientOptions -------------------------------------------------

/// The view a client has on the routes of a RIB.
///
/// `best_only` takes precedence over `ecmp_only`, which takes precedence
/// over `max_paths`. With none of them set, the client sees every path
/// that is not hidden.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Only the best path of a route.
    pub best_only: bool,
    /// Only the paths that are as good as the best path.
    pub ecmp_only: bool,
    /// At most this many paths, best first. `None` means no limit.
    pub max_paths: Option<usize>,
    /// The BGP neighbour the client feeds. Paths learned from it, and
    /// paths whose communities forbid it, are left out of the client's
    /// view.
    pub peer: Option<PeerInfo>,
}

impl ClientOptions {
    /// Options for a client that sees the best path only.
    pub fn best() -> Self {
        Self {
            best_only: true,
            ..Default::default()
        }
    }

    /// Options for a client that sees the multipath set.
    pub fn ecmp() -> Self {
        Self {
            ecmp_only: true,
            ..Default::default()
        }
    }

    /// Options for a client that sees the `n` best paths.
    pub fn n_best(n: usize) -> Self {
        Self {
            max_paths: Some(n),
            ..Default::default()
        }
    }

    /// These options, for a client that feeds `peer`.
    pub fn for_peer(self, peer: PeerInfo) -> Self {
        Self {
            peer: Some(peer),
            ..self
        }
    }

    /// The number of paths the client sees of a route that has
    /// `ecmp_paths` paths in its multipath set.
    pub fn max_paths(&self, ecmp_paths: usize) -> usize {
        if self.best_only {
            return 1;
        }
        if self.ecmp_only {
            return ecmp_paths;
        }
        self.max_paths.unwrap_or(usize::MAX)
    }
}

//------------ Afi -----------------------------------------------------------

/// The address family a RIB is restricted to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Afi {
    Ipv4,
    Ipv6,
}

impl Afi {
    pub fn matches(&self, prefix: &inetnum::addr::Prefix) -> bool {
        match self {
            Afi::Ipv4 => prefix.is_v4(),
            Afi::Ipv6 => !prefix.is_v4(),
        }
    }
}

impl std::fmt::Display for Afi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Afi::Ipv4 => write!(f, "ipv4"),
            Afi::Ipv6 => write!(f, "ipv6"),
        }
    }
}

//------------ RibConfig -----------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RibConfig {
    /// The name of the RIB, used in log messages and as the key in a VRF.
    pub name: String,
    /// Reject prefixes of any other address family. `None` accepts both.
    pub afi: Option<Afi>,
    /// Whether the peer feeding a received RIB sends multiple paths per
    /// prefix (BGP ADD-PATH receive). Without it, a new path for a prefix
    /// replaces the stored one.
    pub add_path_rx: bool,
    /// Whether an outgoing RIB sends multiple paths per prefix to its peer
    /// (BGP ADD-PATH send), each with a path identifier of its own.
    pub add_path_tx: bool,
}

impl Default for RibConfig {
    fn default() -> Self {
        Self {
            name: "rib".to_string(),
            afi: None,
            add_path_rx: false,
            add_path_tx: false,
        }
    }
}

impl RibConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
