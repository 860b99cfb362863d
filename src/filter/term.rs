use inetnum::addr::Prefix;
use log::trace;

use crate::route::{Community, Path};

use super::actions::Action;

//------------ RouteFilter ---------------------------------------------------

/// How a [RouteFilter] compares a prefix against its own prefix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RouteFilterMatcher {
    /// The prefix equals the filter prefix.
    Exact,
    /// The prefix equals the filter prefix, or is a more-specific of it.
    OrLonger,
    /// The prefix is a strict more-specific of the filter prefix.
    Longer,
    /// The prefix is covered by the filter prefix and its length lies in
    /// `min..=max`.
    InRange { min: u8, max: u8 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RouteFilter {
    pub prefix: Prefix,
    pub matcher: RouteFilterMatcher,
}

impl RouteFilter {
    pub fn new(prefix: Prefix, matcher: RouteFilterMatcher) -> Self {
        Self { prefix, matcher }
    }

    pub fn matches(&self, prefix: &Prefix) -> bool {
        match self.matcher {
            RouteFilterMatcher::Exact => *prefix == self.prefix,
            RouteFilterMatcher::OrLonger => covers(&self.prefix, prefix),
            RouteFilterMatcher::Longer => {
                *prefix != self.prefix && covers(&self.prefix, prefix)
            }
            RouteFilterMatcher::InRange { min, max } => {
                covers(&self.prefix, prefix)
                    && (min..=max).contains(&prefix.len())
            }
        }
    }
}

// Whether `outer` is equal to, or a less-specific of `inner`.
fn covers(outer: &Prefix, inner: &Prefix) -> bool {
    if outer.is_v4() != inner.is_v4() || inner.len() < outer.len() {
        return false;
    }
    Prefix::new_relaxed(inner.addr(), outer.len())
        .map(|p| p == *outer)
        .unwrap_or(false)
}

//------------ TermCondition -------------------------------------------------

/// One condition of the `from` part of a [Term].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermCondition {
    /// The prefix is exactly one of the listed prefixes.
    PrefixList(Vec<Prefix>),
    /// The prefix matches any of the route filters.
    RouteFilters(Vec<RouteFilter>),
    /// The path is a BGP path carrying the community.
    Community(Community),
}

impl TermCondition {
    pub fn matches(&self, prefix: &Prefix, path: &Path) -> bool {
        match self {
            TermCondition::PrefixList(list) => list.contains(prefix),
            TermCondition::RouteFilters(filters) => {
                filters.iter().any(|f| f.matches(prefix))
            }
            TermCondition::Community(community) => path
                .bgp()
                .map(|b| b.communities.contains(community))
                .unwrap_or(false),
        }
    }
}

//------------ Term ----------------------------------------------------------

/// The outcome of running a path through a term.
#[derive(Clone, Debug)]
pub struct TermResult {
    pub path: Path,
    /// Whether an accept or reject action ended the filter.
    pub terminate: bool,
    pub reject: bool,
}

/// A named rule: when any condition in `from` matches (or `from` is
/// empty), the actions in `then` are applied in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub name: String,
    pub from: Vec<TermCondition>,
    pub then: Vec<Action>,
}

impl Term {
    pub fn new(
        name: impl Into<String>,
        from: Vec<TermCondition>,
        then: Vec<Action>,
    ) -> Self {
        Self {
            name: name.into(),
            from,
            then,
        }
    }

    pub fn matches(&self, prefix: &Prefix, path: &Path) -> bool {
        self.from.is_empty()
            || self.from.iter().any(|c| c.matches(prefix, path))
    }

    pub fn process(&self, prefix: &Prefix, path: Path) -> TermResult {
        if !self.matches(prefix, &path) {
            return TermResult {
                path,
                terminate: false,
                reject: false,
            };
        }

        trace!("term {} matches {}", self.name, prefix);
        let mut path = path;
        for action in &self.then {
            match action {
                Action::Accept => {
                    return TermResult {
                        path,
                        terminate: true,
                        reject: false,
                    }
                }
                Action::Reject => {
                    return TermResult {
                        path,
                        terminate: true,
                        reject: true,
                    }
                }
                action => action.apply(&mut path),
            }
        }

        TermResult {
            path,
            terminate: false,
            reject: false,
        }
    }
}
