//------------ Types for Statistics -----------------------------------------

use std::fmt::{Debug, Display};

//------------ Counters -----------------------------------------------------
//
// This is the struct that's part of the data structure of each trie. It is
// only ever mutated while holding the write lock of the owning RIB, so the
// values don't have to be atomic.

#[derive(Debug, Clone)]
pub(crate) struct Counters {
    // number of created nodes in the trie, placeholders included. Nodes are
    // never removed, so this number only grows.
    nodes: usize,
    // number of active prefixes in the trie, per prefix length
    prefixes: Vec<usize>,
    // number of paths stored in all active nodes.
    paths: usize,
}

impl Counters {
    pub fn nodes_count(&self) -> usize {
        self.nodes
    }

    pub fn inc_nodes_count(&mut self) {
        self.nodes += 1;
    }

    pub fn routes_count(&self) -> usize {
        self.prefixes.iter().sum()
    }

    pub fn inc_prefixes_count(&mut self, len: u8) {
        if let Some(p) = self.prefixes.get_mut(len as usize) {
            *p += 1;
        }
    }

    pub fn dec_prefixes_count(&mut self, len: u8) {
        if let Some(p) = self.prefixes.get_mut(len as usize) {
            *p = p.saturating_sub(1);
        }
    }

    pub fn paths_count(&self) -> usize {
        self.paths
    }

    pub fn add_paths_count(&mut self, added: usize, removed: usize) {
        self.paths = (self.paths + added).saturating_sub(removed);
    }

    pub fn prefix_stats(&self) -> Vec<CreatedNodes> {
        self.prefixes
            .iter()
            .enumerate()
            .filter_map(|(len, count)| -> Option<CreatedNodes> {
                if *count != 0 {
                    Some(CreatedNodes {
                        depth_level: len as u8,
                        count: *count,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            nodes: 0,
            prefixes: vec![0; 129],
            paths: 0,
        }
    }
}

//------------ CreatedNodes --------------------------------------------------

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct CreatedNodes {
    pub depth_level: u8,
    pub count: usize,
}

impl Debug for CreatedNodes {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_fmt(format_args!("/{}: {}", &self.depth_level, &self.count))
    }
}

//------------ TrieStats -----------------------------------------------------

/// A snapshot of the counters of one trie.
///
/// Withdrawn nodes stay in the trie as inactive nodes, they are never
/// compacted. The `inactive` count shows how many nodes are kept around
/// purely for the structure of the trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieStats {
    /// Total number of nodes, active and inactive.
    pub nodes: usize,
    /// Number of nodes holding no paths: placeholders and withdrawn routes.
    pub inactive: usize,
    /// Number of active routes, i.e. prefixes with at least one path.
    pub routes: usize,
    /// Number of paths over all active routes.
    pub paths: usize,
    /// Number of active routes per prefix length, only non-zero lengths.
    pub prefixes: Vec<CreatedNodes>,
}

impl From<&Counters> for TrieStats {
    fn from(value: &Counters) -> Self {
        let routes = value.routes_count();
        Self {
            nodes: value.nodes_count(),
            inactive: value.nodes_count().saturating_sub(routes),
            routes,
            paths: value.paths_count(),
            prefixes: value.prefix_stats(),
        }
    }
}

impl Display for TrieStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "nodes:{:>8} inactive:{:>8} routes:{:>8} paths:{:>8} {:?}",
            self.nodes, self.inactive, self.routes, self.paths, self.prefixes
        )
    }
}

//------------ RibStats ------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RibStats {
    pub v4: TrieStats,
    pub v6: TrieStats,
}

impl Display for RibStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "IPv4 {}", self.v4)?;
        write!(f, "IPv6 {}", self.v6)
    }
}
