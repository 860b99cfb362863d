use std::net::IpAddr;

use inetnum::asn::Asn;

use crate::route::{Community, Path};

//------------ Action --------------------------------------------------------

/// What a [super::Term] does with a path it matches.
///
/// `Accept` and `Reject` end the filter the term is in. The other actions
/// modify the BGP attributes of the path and leave paths of other
/// protocols alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Accept,
    Reject,
    SetLocalPref(u32),
    SetNextHop(IpAddr),
    AsPathPrepend { asn: Asn, times: u8 },
    AddCommunity(Community),
}

impl Action {
    /// Apply a modifying action to `path`. Does nothing for `Accept` and
    /// `Reject`.
    pub fn apply(&self, path: &mut Path) {
        if matches!(self, Action::Accept | Action::Reject) {
            return;
        }
        let Some(bgp) = path.bgp_mut() else {
            return;
        };
        match self {
            Action::Accept | Action::Reject => {}
            Action::SetLocalPref(local_pref) => bgp.local_pref = *local_pref,
            Action::SetNextHop(next_hop) => bgp.next_hop = *next_hop,
            Action::AsPathPrepend { asn, times } => {
                bgp.as_path.prepend(*asn, *times)
            }
            Action::AddCommunity(community) => {
                if !bgp.communities.contains(community) {
                    bgp.communities.push(*community);
                }
            }
        }
    }
}
