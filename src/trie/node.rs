use log::trace;

use crate::route::Route;
use crate::types::stats::Counters;
use crate::types::{AddressFamily, PrefixId};

//------------ TrieNode ------------------------------------------------------

/// A node in a [super::PrefixTrie].
///
/// Every node owns a route, which may be empty. A node with an empty route
/// is inactive: it is either a placeholder that was created as the branch
/// point for two prefixes, or a node whose last path was withdrawn. Inactive
/// nodes are never unlinked, they keep the trie connected for the nodes
/// below them.
///
/// The children of a node are more-specifics of the node. The `low` child
/// has the bit right after the prefix of the node unset, the `high` child
/// has that bit set.
#[derive(Debug)]
pub(crate) struct TrieNode<AF: AddressFamily> {
    pub(crate) prefix: PrefixId<AF>,
    pub(crate) route: Route,
    pub(crate) low: Option<Box<TrieNode<AF>>>,
    pub(crate) high: Option<Box<TrieNode<AF>>>,
}

impl<AF: AddressFamily> TrieNode<AF> {
    /// Create a node holding `route`. The counters are updated for the new
    /// node and its paths.
    pub(crate) fn new(
        prefix: PrefixId<AF>,
        route: Route,
        counters: &mut Counters,
    ) -> Self {
        counters.inc_nodes_count();
        let mut node = Self::placeholder(prefix);
        let before = node.begin_update();
        node.route = route;
        node.end_update(before, counters);
        node
    }

    /// Create an inactive node for `prefix`. Only the caller knows whether
    /// the node is created or moved around, so it has to do the counting.
    pub(crate) fn placeholder(prefix: PrefixId<AF>) -> Self {
        Self {
            prefix,
            route: Route::new(prefix.into()),
            low: None,
            high: None,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        !self.route.is_empty()
    }

    pub(crate) fn child(&self, high: bool) -> Option<&TrieNode<AF>> {
        if high {
            self.high.as_deref()
        } else {
            self.low.as_deref()
        }
    }

    pub(crate) fn child_mut(
        &mut self,
        high: bool,
    ) -> &mut Option<Box<TrieNode<AF>>> {
        if high {
            &mut self.high
        } else {
            &mut self.low
        }
    }

    /// Hang `node` into the child slot it belongs in. `node` must be a
    /// more-specific of self.
    pub(crate) fn adopt(&mut self, node: Box<TrieNode<AF>>) {
        let high = node.prefix.bit_at(self.prefix.get_len());
        trace!(
            "{} adopts {} as {} child",
            self.prefix,
            node.prefix,
            if high { "high" } else { "low" }
        );
        *self.child_mut(high) = Some(node);
    }

    /// Merge the paths of `route` into the route of this node, activating
    /// the node if it was inactive.
    pub(crate) fn merge(
        &mut self,
        mut route: Route,
        counters: &mut Counters,
    ) {
        let before = self.begin_update();
        self.route.add_paths(route.take_paths());
        self.end_update(before, counters);
    }

    /// Record the state of the node before a change of its paths, to be
    /// handed to `end_update` after the change.
    pub(crate) fn begin_update(&self) -> NodeState {
        NodeState {
            active: self.is_active(),
            paths: self.route.len(),
        }
    }

    /// Bring the counters in line with the change since `before`.
    pub(crate) fn end_update(
        &mut self,
        before: NodeState,
        counters: &mut Counters,
    ) {
        counters.add_paths_count(self.route.len(), before.paths);
        match (before.active, self.is_active()) {
            (false, true) => {
                trace!("activate node {}", self.prefix);
                counters.inc_prefixes_count(self.prefix.get_len());
            }
            (true, false) => {
                trace!("deactivate node {}", self.prefix);
                counters.dec_prefixes_count(self.prefix.get_len());
            }
            _ => {}
        }
    }

    /// Push the active routes of this node and all nodes below it into
    /// `routes`, in address order.
    pub(crate) fn collect_active<'a>(&'a self, routes: &mut Vec<&'a Route>) {
        if self.is_active() {
            routes.push(&self.route);
        }
        if let Some(low) = self.low.as_deref() {
            low.collect_active(routes);
        }
        if let Some(high) = self.high.as_deref() {
            high.collect_active(routes);
        }
    }

    pub(crate) fn for_each_active_mut(
        &mut self,
        f: &mut impl FnMut(&mut Route),
        counters: &mut Counters,
    ) {
        if self.is_active() {
            let before = self.begin_update();
            f(&mut self.route);
            self.end_update(before, counters);
        }
        if let Some(low) = self.low.as_deref_mut() {
            low.for_each_active_mut(f, counters);
        }
        if let Some(high) = self.high.as_deref_mut() {
            high.for_each_active_mut(f, counters);
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct NodeState {
    active: bool,
    paths: usize,
}
