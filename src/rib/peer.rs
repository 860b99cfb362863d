use std::net::IpAddr;

use serde_derive::{Deserialize, Serialize};

use crate::route::{Community, Path};

//------------ PeerInfo ------------------------------------------------------

/// The BGP neighbour a client sends its paths to.
///
/// A client registered with a [PeerInfo] in its options is not shown the
/// paths that must not be advertised to that neighbour, see
/// [should_propagate].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerInfo {
    /// The address of the neighbour.
    pub address: IpAddr,
    /// Whether the session with the neighbour is internal.
    pub ibgp: bool,
}

impl PeerInfo {
    pub fn ebgp(address: IpAddr) -> Self {
        Self {
            address,
            ibgp: false,
        }
    }

    pub fn ibgp(address: IpAddr) -> Self {
        Self {
            address,
            ibgp: true,
        }
    }

    /// Whether `path` was learned from this neighbour.
    pub fn is_own_path(&self, path: &Path) -> bool {
        path.bgp().is_some_and(|bgp| bgp.source == self.address)
    }

    /// Whether the communities of `path` forbid advertising it to this
    /// neighbour. NO_ADVERTISE forbids it for every neighbour, NO_EXPORT
    /// for external ones only.
    pub fn is_disallowed_by_community(&self, path: &Path) -> bool {
        let Some(bgp) = path.bgp() else {
            return false;
        };
        bgp.communities.iter().any(|c| {
            *c == Community::NO_ADVERTISE
                || (*c == Community::NO_EXPORT && !self.ibgp)
        })
    }
}

impl std::fmt::Display for PeerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.ibgp { "ibgp" } else { "ebgp" };
        write!(f, "{} ({})", self.address, kind)
    }
}

/// Whether `path` may be sent to `peer` at all: it wasn't learned from
/// the peer, and its communities allow it.
pub fn should_propagate(path: &Path, peer: &PeerInfo) -> bool {
    !peer.is_own_path(path) && !peer.is_disallowed_by_community(path)
}
