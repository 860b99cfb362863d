use std::cmp::Ordering;

use log::trace;

use super::path::{Path, PathAttrs};

//------------ Path selection ------------------------------------------------
//
// The decision process is expressed as a total order over paths: hidden
// paths sort after all visible paths, then the protocol precedence decides,
// and between two paths of the same protocol the comparator of that
// protocol decides. Sorting the paths of a route with this order puts the
// best path first, and the active (multipath) set is the run of paths at
// the start of the vector that are multipath-equal to the best one.
//
// Since the order is total, the outcome only depends on the set of paths,
// never on the order in which they were added.

/// Compare two paths for selection. `Ordering::Less` means `a` is
/// preferred over `b`.
pub fn select_cmp(a: &Path, b: &Path) -> Ordering {
    a.is_hidden()
        .cmp(&b.is_hidden())
        .then_with(|| a.protocol().cmp(&b.protocol()))
        .then_with(|| match (&a.attrs, &b.attrs) {
            (PathAttrs::Static(x), PathAttrs::Static(y)) => x.cmp(y),
            (PathAttrs::Bgp(x), PathAttrs::Bgp(y)) => x.select_cmp(y),
            (PathAttrs::Ospf(x), PathAttrs::Ospf(y)) => x.cmp(y),
            (PathAttrs::Isis(x), PathAttrs::Isis(y)) => x.cmp(y),
            (PathAttrs::Fib(x), PathAttrs::Fib(y)) => x.cmp(y),
            _ => Ordering::Equal,
        })
}

/// Whether two paths are equally good, so that both can be used at the
/// same time. Hidden paths are never equal to anything. All static paths
/// are equal to each other.
pub fn ecmp(a: &Path, b: &Path) -> bool {
    if a.is_hidden() || b.is_hidden() {
        return false;
    }
    match (&a.attrs, &b.attrs) {
        (PathAttrs::Static(_), PathAttrs::Static(_)) => true,
        (PathAttrs::Bgp(x), PathAttrs::Bgp(y)) => x.ecmp(y),
        (PathAttrs::Ospf(x), PathAttrs::Ospf(y)) => {
            x.path_type == y.path_type && x.metric == y.metric
        }
        (PathAttrs::Isis(x), PathAttrs::Isis(y)) => {
            x.level == y.level && x.metric == y.metric
        }
        (PathAttrs::Fib(x), PathAttrs::Fib(y)) => x.priority == y.priority,
        _ => false,
    }
}

/// Sort `paths` best first and return the number of active paths, i.e.
/// the length of the multipath set at the start of the slice. Returns zero
/// if there is no visible path.
pub(crate) fn select(paths: &mut [Path]) -> usize {
    paths.sort_by(select_cmp);

    let active = match paths.first() {
        Some(best) if !best.is_hidden() => {
            paths.iter().take_while(|p| ecmp(best, p)).count()
        }
        _ => 0,
    };
    trace!("selected {} active path(s) out of {}", active, paths.len());

    active
}
