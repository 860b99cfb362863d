//! A binary prefix trie that owns the routes of one address family.
//!
//! The trie is path-compressed: a node only exists for a prefix that was
//! inserted, or for the common supernet of two prefixes that have no
//! inserted ancestor in common. Every prefix has at most one node, the
//! depth of the trie is bounded by the width of the address family.
//!
//! Nodes whose last path is removed are kept as inactive nodes. The trie is
//! never compacted, so the shape of the trie only depends on the set of
//! prefixes that were ever inserted.

use inetnum::addr::Prefix;
use log::trace;

use crate::errors::RibError;
use crate::match_options::{MatchOptions, MatchType, QueryResult};
use crate::route::{HiddenReason, Path, Route};
use crate::types::stats::{Counters, TrieStats};
use crate::types::{AddressFamily, PrefixId};

mod node;
pub mod table;

pub(crate) use node::TrieNode;

#[cfg(test)]
mod tests;

//------------ PrefixTrie ----------------------------------------------------

#[derive(Debug)]
pub(crate) struct PrefixTrie<AF: AddressFamily> {
    root: Option<Box<TrieNode<AF>>>,
    counters: Counters,
}

// The action to take in one slot of the trie for an insert.
enum InsertStep<AF: AddressFamily> {
    // The slot is empty, the new node goes here.
    Vacant,
    // The slot holds the node for the inserted prefix.
    Merge,
    // The inserted prefix is a more-specific of the node in the slot, go
    // down into the low (false) or high (true) child.
    Descend(bool),
    // The inserted prefix is a less-specific of the node in the slot, the
    // node moves one level down below the new node.
    PushDown,
    // The prefixes don't contain each other, a placeholder for their
    // common supernet takes the slot, with both nodes below it.
    Split(PrefixId<AF>),
}

impl<AF: AddressFamily> PrefixTrie<AF> {
    pub(crate) fn new() -> Self {
        Self {
            root: None,
            counters: Counters::default(),
        }
    }

    //-------- Mutation ------------------------------------------------------

    /// Insert `route` under `prefix`. If a node for the prefix exists, the
    /// paths are merged into the route of the node.
    pub(crate) fn insert(&mut self, prefix: PrefixId<AF>, route: Route) {
        trace!("insert {} with {} path(s)", prefix, route.len());
        Self::insert_at(&mut self.root, prefix, route, &mut self.counters);
    }

    fn insert_at(
        slot: &mut Option<Box<TrieNode<AF>>>,
        prefix: PrefixId<AF>,
        route: Route,
        counters: &mut Counters,
    ) {
        let step = match slot.as_deref() {
            None => InsertStep::Vacant,
            Some(node) if node.prefix == prefix => InsertStep::Merge,
            Some(node) if node.prefix.contains(&prefix) => {
                InsertStep::Descend(prefix.bit_at(node.prefix.get_len()))
            }
            Some(node) if prefix.contains(&node.prefix) => {
                InsertStep::PushDown
            }
            Some(node) => {
                InsertStep::Split(prefix.common_supernet(&node.prefix))
            }
        };

        match step {
            InsertStep::Vacant => {
                let node = TrieNode::new(prefix, route, counters);
                *slot = Some(Box::new(node));
            }
            InsertStep::Merge => {
                if let Some(node) = slot.as_deref_mut() {
                    node.merge(route, counters);
                }
            }
            InsertStep::Descend(high) => {
                if let Some(node) = slot.as_deref_mut() {
                    Self::insert_at(
                        node.child_mut(high),
                        prefix,
                        route,
                        counters,
                    );
                }
            }
            InsertStep::PushDown => {
                let mut new = TrieNode::new(prefix, route, counters);
                if let Some(below) = slot.take() {
                    new.adopt(below);
                }
                *slot = Some(Box::new(new));
            }
            InsertStep::Split(supernet) => {
                trace!("placeholder {} for {}", supernet, prefix);
                counters.inc_nodes_count();
                let mut placeholder = TrieNode::placeholder(supernet);
                if let Some(existing) = slot.take() {
                    placeholder.adopt(existing);
                }
                placeholder
                    .adopt(Box::new(TrieNode::new(prefix, route, counters)));
                *slot = Some(Box::new(placeholder));
            }
        }
    }

    /// Remove `path` from the route of `prefix`. The node is deactivated
    /// when its last path goes. Returns whether the path was present.
    pub(crate) fn remove_path(
        &mut self,
        prefix: PrefixId<AF>,
        path: &Path,
    ) -> bool {
        let Some(node) = Self::find_mut(&mut self.root, prefix) else {
            return false;
        };
        let before = node.begin_update();
        let found = node.route.remove_path(path);
        node.end_update(before, &mut self.counters);
        found
    }

    /// Remove every path of `route` from the route stored for the same
    /// prefix. Returns whether the stored route is empty afterwards, which
    /// is also the case if the prefix is not in the trie.
    pub(crate) fn remove_route(
        &mut self,
        prefix: PrefixId<AF>,
        route: &Route,
    ) -> bool {
        let Some(node) = Self::find_mut(&mut self.root, prefix) else {
            return true;
        };
        let before = node.begin_update();
        let empty = node.route.remove_paths_of(route);
        node.end_update(before, &mut self.counters);
        empty
    }

    /// Remove all paths of `prefix`, returning the route as it was.
    pub(crate) fn remove_prefix(
        &mut self,
        prefix: PrefixId<AF>,
    ) -> Option<Route> {
        let node = Self::find_mut(&mut self.root, prefix)?;
        if !node.is_active() {
            return None;
        }
        let old = node.route.clone();
        let before = node.begin_update();
        node.route.take_paths();
        node.end_update(before, &mut self.counters);
        Some(old)
    }

    /// Substitute `new` for `old` in the route of `prefix`.
    pub(crate) fn replace_path(
        &mut self,
        prefix: PrefixId<AF>,
        old: &Path,
        new: Path,
    ) -> Result<(), RibError> {
        let node = Self::find_mut(&mut self.root, prefix)
            .filter(|n| n.is_active())
            .ok_or(RibError::PrefixNotFound)?;
        let before = node.begin_update();
        let res = node.route.replace_path(old, new);
        node.end_update(before, &mut self.counters);
        res
    }

    /// Make `new` the only path of `prefix`, inserting the prefix if
    /// needed. Returns the paths that were replaced.
    pub(crate) fn replace_all(
        &mut self,
        prefix: PrefixId<AF>,
        new: Path,
    ) -> Vec<Path> {
        match Self::find_mut(&mut self.root, prefix) {
            Some(node) => {
                let before = node.begin_update();
                let old = node.route.replace_all(new);
                node.end_update(before, &mut self.counters);
                old
            }
            None => {
                self.insert(prefix, Route::with_path(prefix.into(), new));
                vec![]
            }
        }
    }

    /// Set the hidden marker of `path` in the route of `prefix`.
    pub(crate) fn set_hidden(
        &mut self,
        prefix: PrefixId<AF>,
        path: &Path,
        reason: Option<HiddenReason>,
    ) -> bool {
        Self::find_mut(&mut self.root, prefix)
            .map(|node| node.route.set_hidden(path, reason))
            .unwrap_or(false)
    }

    /// Call `f` for the route of every active node. The counters are kept
    /// up to date for whatever `f` does to the paths of the route.
    pub(crate) fn for_each_route_mut(
        &mut self,
        mut f: impl FnMut(&mut Route),
    ) {
        if let Some(root) = self.root.as_deref_mut() {
            root.for_each_active_mut(&mut f, &mut self.counters);
        }
    }

    /// Empty the trie, returning all active routes in address order.
    pub(crate) fn drain(&mut self) -> Vec<Route> {
        let routes = self.dump().into_iter().cloned().collect();
        *self = Self::new();
        routes
    }

    //-------- Queries -------------------------------------------------------

    fn find(&self, prefix: PrefixId<AF>) -> Option<&TrieNode<AF>> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            if node.prefix == prefix {
                return Some(node);
            }
            if !node.prefix.contains(&prefix) {
                return None;
            }
            cur = node.child(prefix.bit_at(node.prefix.get_len()));
        }
        None
    }

    fn find_mut(
        slot: &mut Option<Box<TrieNode<AF>>>,
        prefix: PrefixId<AF>,
    ) -> Option<&mut TrieNode<AF>> {
        let mut cur = slot.as_deref_mut();
        while let Some(node) = cur {
            if node.prefix == prefix {
                return Some(node);
            }
            if !node.prefix.contains(&prefix) {
                return None;
            }
            let high = prefix.bit_at(node.prefix.get_len());
            cur = node.child_mut(high).as_deref_mut();
        }
        None
    }

    /// The route for exactly `prefix`, if it is active.
    pub(crate) fn get(&self, prefix: PrefixId<AF>) -> Option<&Route> {
        self.find(prefix)
            .filter(|n| n.is_active())
            .map(|n| &n.route)
    }

    /// All active routes for prefixes that are equal to, or less specific
    /// than `prefix`, least specific first.
    pub(crate) fn lpm(&self, prefix: PrefixId<AF>) -> Vec<&Route> {
        let mut routes = vec![];
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            if !node.prefix.covers(&prefix) {
                break;
            }
            if node.is_active() {
                routes.push(&node.route);
            }
            if node.prefix == prefix {
                break;
            }
            cur = node.child(prefix.bit_at(node.prefix.get_len()));
        }
        routes
    }

    /// All active routes for `prefix` and its more-specifics, in address
    /// order. This works whether or not `prefix` itself is in the trie.
    pub(crate) fn get_longer(&self, prefix: PrefixId<AF>) -> Vec<&Route> {
        let mut routes = vec![];
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            if prefix.covers(&node.prefix) {
                node.collect_active(&mut routes);
                break;
            }
            if !node.prefix.contains(&prefix) {
                break;
            }
            cur = node.child(prefix.bit_at(node.prefix.get_len()));
        }
        routes
    }

    /// All active routes, in address order.
    pub(crate) fn dump(&self) -> Vec<&Route> {
        let mut routes = vec![];
        if let Some(root) = self.root.as_deref() {
            root.collect_active(&mut routes);
        }
        routes
    }

    pub(crate) fn match_prefix(
        &self,
        prefix: PrefixId<AF>,
        options: &MatchOptions,
    ) -> QueryResult {
        let found = match options.match_type {
            MatchType::ExactMatch => self.get(prefix),
            MatchType::LongestMatch | MatchType::EmptyMatch => {
                self.lpm(prefix).last().copied()
            }
        };

        let match_type = match found {
            Some(route) if route.prefix() == Prefix::from(prefix) => {
                MatchType::ExactMatch
            }
            Some(_) => MatchType::LongestMatch,
            None => MatchType::EmptyMatch,
        };
        let anchor = found
            .map(|r| PrefixId::<AF>::from(r.prefix()))
            .unwrap_or(prefix);

        let less_specifics = options.include_less_specifics.then(|| {
            self.lpm(anchor)
                .into_iter()
                .filter(|r| Some(r.prefix()) != found.map(|f| f.prefix()))
                .cloned()
                .collect::<Vec<_>>()
        });
        let more_specifics = options.include_more_specifics.then(|| {
            self.get_longer(anchor)
                .into_iter()
                .filter(|r| Some(r.prefix()) != found.map(|f| f.prefix()))
                .cloned()
                .collect::<Vec<_>>()
        });

        QueryResult {
            match_type,
            prefix: found.map(|r| r.prefix()),
            route: found.cloned(),
            less_specifics,
            more_specifics,
        }
    }

    pub(crate) fn route_count(&self) -> usize {
        self.counters.routes_count()
    }

    pub(crate) fn stats(&self) -> TrieStats {
        TrieStats::from(&self.counters)
    }
}

impl<AF: AddressFamily> Default for PrefixTrie<AF> {
    fn default() -> Self {
        Self::new()
    }
}
