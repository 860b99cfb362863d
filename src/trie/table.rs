use inetnum::addr::Prefix;

use crate::errors::RibError;
use crate::match_options::{MatchOptions, QueryResult};
use crate::route::{HiddenReason, Path, Route};
use crate::stats::RibStats;
use crate::types::PrefixId;
use crate::{IPv4, IPv6};

use super::PrefixTrie;

//------------ RoutingTable --------------------------------------------------

/// The routes of both address families, one trie per family.
///
/// All methods take an [inetnum::addr::Prefix] and hand it to the trie of
/// its family. The table has no locking of its own, the RIBs own a table
/// behind their lock.
#[derive(Debug, Default)]
pub struct RoutingTable {
    v4: PrefixTrie<IPv4>,
    v6: PrefixTrie<IPv6>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `path` to the route of `prefix`, creating the route if needed.
    pub fn add_path(&mut self, prefix: &Prefix, path: Path) {
        self.insert(Route::with_path(*prefix, path));
    }

    /// Merge the paths of `route` into the route for its prefix.
    pub fn insert(&mut self, route: Route) {
        let prefix = route.prefix();
        match prefix.addr() {
            std::net::IpAddr::V4(_) => {
                self.v4.insert(PrefixId::<IPv4>::from(prefix), route)
            }
            std::net::IpAddr::V6(_) => {
                self.v6.insert(PrefixId::<IPv6>::from(prefix), route)
            }
        }
    }

    /// Remove `path` from the route of `prefix`. Returns whether the path
    /// was present.
    pub fn remove_path(&mut self, prefix: &Prefix, path: &Path) -> bool {
        match prefix.addr() {
            std::net::IpAddr::V4(_) => {
                self.v4.remove_path(PrefixId::<IPv4>::from(*prefix), path)
            }
            std::net::IpAddr::V6(_) => {
                self.v6.remove_path(PrefixId::<IPv6>::from(*prefix), path)
            }
        }
    }

    /// Remove all paths of `route` from the stored route of its prefix.
    /// Returns whether the stored route has no paths left.
    pub fn remove_route(&mut self, route: &Route) -> bool {
        let prefix = route.prefix();
        match prefix.addr() {
            std::net::IpAddr::V4(_) => {
                self.v4.remove_route(PrefixId::<IPv4>::from(prefix), route)
            }
            std::net::IpAddr::V6(_) => {
                self.v6.remove_route(PrefixId::<IPv6>::from(prefix), route)
            }
        }
    }

    /// Remove all paths of `prefix`. Returns the route as it was, if the
    /// prefix was present.
    pub fn remove_prefix(&mut self, prefix: &Prefix) -> Option<Route> {
        match prefix.addr() {
            std::net::IpAddr::V4(_) => {
                self.v4.remove_prefix(PrefixId::<IPv4>::from(*prefix))
            }
            std::net::IpAddr::V6(_) => {
                self.v6.remove_prefix(PrefixId::<IPv6>::from(*prefix))
            }
        }
    }

    /// Substitute `new` for `old` in the route of `prefix`.
    pub fn replace_path(
        &mut self,
        prefix: &Prefix,
        old: &Path,
        new: Path,
    ) -> Result<(), RibError> {
        match prefix.addr() {
            std::net::IpAddr::V4(_) => self.v4.replace_path(
                PrefixId::<IPv4>::from(*prefix),
                old,
                new,
            ),
            std::net::IpAddr::V6(_) => self.v6.replace_path(
                PrefixId::<IPv6>::from(*prefix),
                old,
                new,
            ),
        }
    }

    /// Make `new` the only path of `prefix`. Returns the paths it replaced.
    pub fn replace_all(&mut self, prefix: &Prefix, new: Path) -> Vec<Path> {
        match prefix.addr() {
            std::net::IpAddr::V4(_) => {
                self.v4.replace_all(PrefixId::<IPv4>::from(*prefix), new)
            }
            std::net::IpAddr::V6(_) => {
                self.v6.replace_all(PrefixId::<IPv6>::from(*prefix), new)
            }
        }
    }

    /// Set or clear the hidden marker of a stored path.
    pub fn set_hidden(
        &mut self,
        prefix: &Prefix,
        path: &Path,
        reason: Option<HiddenReason>,
    ) -> bool {
        match prefix.addr() {
            std::net::IpAddr::V4(_) => self.v4.set_hidden(
                PrefixId::<IPv4>::from(*prefix),
                path,
                reason,
            ),
            std::net::IpAddr::V6(_) => self.v6.set_hidden(
                PrefixId::<IPv6>::from(*prefix),
                path,
                reason,
            ),
        }
    }

    /// Call `f` for every active route, IPv4 first.
    pub fn for_each_route_mut(&mut self, mut f: impl FnMut(&mut Route)) {
        self.v4.for_each_route_mut(&mut f);
        self.v6.for_each_route_mut(&mut f);
    }

    /// Remove all routes, returning them.
    pub fn drain(&mut self) -> Vec<Route> {
        let mut routes = self.v4.drain();
        routes.extend(self.v6.drain());
        routes
    }

    pub fn get(&self, prefix: &Prefix) -> Option<&Route> {
        match prefix.addr() {
            std::net::IpAddr::V4(_) => {
                self.v4.get(PrefixId::<IPv4>::from(*prefix))
            }
            std::net::IpAddr::V6(_) => {
                self.v6.get(PrefixId::<IPv6>::from(*prefix))
            }
        }
    }

    pub fn contains_pfx_path(&self, prefix: &Prefix, path: &Path) -> bool {
        self.get(prefix)
            .map(|r| r.contains_path(path))
            .unwrap_or(false)
    }

    /// The active routes covering `prefix`, least specific first.
    pub fn lpm(&self, prefix: &Prefix) -> Vec<&Route> {
        match prefix.addr() {
            std::net::IpAddr::V4(_) => {
                self.v4.lpm(PrefixId::<IPv4>::from(*prefix))
            }
            std::net::IpAddr::V6(_) => {
                self.v6.lpm(PrefixId::<IPv6>::from(*prefix))
            }
        }
    }

    /// The active routes of `prefix` and all its more-specifics.
    pub fn get_longer(&self, prefix: &Prefix) -> Vec<&Route> {
        match prefix.addr() {
            std::net::IpAddr::V4(_) => {
                self.v4.get_longer(PrefixId::<IPv4>::from(*prefix))
            }
            std::net::IpAddr::V6(_) => {
                self.v6.get_longer(PrefixId::<IPv6>::from(*prefix))
            }
        }
    }

    /// All active routes, IPv4 first, each family in address order.
    pub fn dump(&self) -> Vec<&Route> {
        let mut routes = self.v4.dump();
        routes.extend(self.v6.dump());
        routes
    }

    pub fn match_prefix(
        &self,
        prefix: &Prefix,
        options: &MatchOptions,
    ) -> QueryResult {
        match prefix.addr() {
            std::net::IpAddr::V4(_) => self
                .v4
                .match_prefix(PrefixId::<IPv4>::from(*prefix), options),
            std::net::IpAddr::V6(_) => self
                .v6
                .match_prefix(PrefixId::<IPv6>::from(*prefix), options),
        }
    }

    /// The number of active routes, i.e. prefixes with at least one path.
    pub fn route_count(&self) -> usize {
        self.v4.route_count() + self.v6.route_count()
    }

    pub fn stats(&self) -> RibStats {
        RibStats {
            v4: self.v4.stats(),
            v6: self.v6.stats(),
        }
    }
}
