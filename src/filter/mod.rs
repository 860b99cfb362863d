//! Policy applied to paths before a RIB exposes them.
//!
//! A [FilterChain] is a list of [Filter]s, a filter is a list of [Term]s.
//! A term has conditions and actions. Terms are evaluated in order until
//! one of them accepts or rejects the path. The filters of a chain are
//! evaluated in order until one of them rejects the path.

use inetnum::addr::Prefix;
use log::trace;

use crate::route::Path;

mod actions;
mod term;

pub use actions::Action;
pub use term::{
    RouteFilter, RouteFilterMatcher, Term, TermCondition, TermResult,
};

#[cfg(test)]
mod tests;

//------------ Filter --------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub terms: Vec<Term>,
}

impl Filter {
    pub fn new(name: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            terms,
        }
    }

    /// A filter with a single term that accepts everything.
    pub fn accept_all() -> Self {
        Self::new(
            "accept-all",
            vec![Term::new("accept", vec![], vec![Action::Accept])],
        )
    }

    /// A filter with a single term that rejects everything.
    pub fn reject_all() -> Self {
        Self::new(
            "reject-all",
            vec![Term::new("reject", vec![], vec![Action::Reject])],
        )
    }

    /// Run `path` through the terms. Returns the (possibly modified) path,
    /// and whether it was rejected.
    pub fn process(&self, prefix: &Prefix, path: Path) -> (Path, bool) {
        let mut path = path;
        for term in &self.terms {
            let res = term.process(prefix, path);
            if res.terminate {
                return (res.path, res.reject);
            }
            path = res.path;
        }
        (path, false)
    }
}

//------------ FilterChain ---------------------------------------------------

/// An ordered list of filters. An empty chain accepts everything as is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterChain(Vec<Filter>);

impl FilterChain {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self(filters)
    }

    pub fn filters(&self) -> &[Filter] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Run `path` through all filters, stopping at the first rejection.
    /// Returns the (possibly modified) path, and whether it was rejected.
    pub fn process(&self, prefix: &Prefix, path: Path) -> (Path, bool) {
        let mut path = path;
        for filter in &self.0 {
            let (p, reject) = filter.process(prefix, path);
            if reject {
                trace!("filter {} rejects {} {}", filter.name, prefix, p);
                return (p, true);
            }
            path = p;
        }
        (path, false)
    }
}

impl From<Vec<Filter>> for FilterChain {
    fn from(value: Vec<Filter>) -> Self {
        Self(value)
    }
}
