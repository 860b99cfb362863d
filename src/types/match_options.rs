use std::fmt;

use inetnum::addr::Prefix;

use crate::route::Route;

//------------ MatchOptions / MatchType -------------------------------------

/// Options for the `match_prefix` method
///
/// The `MatchOptions` struct is used to specify the options for the
/// `match_prefix` method on a RIB.
///
/// Note that the `match_type` field may be different from the actual
/// `MatchType` returned from the result.
///
/// See [crate::rib::LocRib::match_prefix] for more details.
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// The requested [MatchType]
    pub match_type: MatchType,
    /// Whether to include all less-specific routes in the query result
    pub include_less_specifics: bool,
    // Whether to include all more-specific routes in the query result
    pub include_more_specifics: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            match_type: MatchType::LongestMatch,
            include_less_specifics: false,
            include_more_specifics: false,
        }
    }
}

/// Option to set the match type for a prefix match. Type can be Exact,
/// Longest, or Empty. The match type only applies to the `prefix` and
/// `route` fields in the [QueryResult] that is returned by a
/// `match_prefix()` query.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MatchType {
    /// Only return the requested prefix, and the associated route, if the
    /// requested prefix exactly matches the found prefix (if any).
    ExactMatch,
    /// Return the longest matching prefix for the requested prefix (if
    /// any). May match the prefix exactly.
    LongestMatch,
    /// Return the longest matching prefix, or none at all.
    EmptyMatch,
}

impl MatchType {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::EmptyMatch)
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MatchType::ExactMatch => write!(f, "exact-match"),
            MatchType::LongestMatch => write!(f, "longest-match"),
            MatchType::EmptyMatch => write!(f, "empty-match"),
        }
    }
}

//------------- QueryResult -------------------------------------------------

/// The type that is returned by a query.
///
/// It contains the route that was found in the RIB, as well as the active
/// less- or more-specific routes as requested. Inactive (withdrawn) nodes
/// of the trie never show up in a query result.
#[derive(Clone, Debug)]
pub struct QueryResult {
    /// The match type of the resulting prefix
    pub match_type: MatchType,
    /// The resulting prefix
    pub prefix: Option<Prefix>,
    /// The route stored for the resulting prefix
    pub route: Option<Route>,
    /// The less-specifics of the resulting prefix, least specific first
    pub less_specifics: Option<Vec<Route>>,
    /// The more-specifics of the resulting prefix
    pub more_specifics: Option<Vec<Route>>,
}

impl QueryResult {
    pub fn empty() -> Self {
        QueryResult {
            match_type: MatchType::EmptyMatch,
            prefix: None,
            route: None,
            less_specifics: None,
            more_specifics: None,
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pfx_str = match self.prefix {
            Some(pfx) => format!("{}", pfx),
            None => "".to_string(),
        };
        writeln!(f, "match_type: {}", self.match_type)?;
        writeln!(f, "prefix: {}", pfx_str)?;
        write!(f, "paths: [ ")?;
        if let Some(route) = &self.route {
            for path in route.paths() {
                write!(f, "{},", path)?;
            }
        }
        writeln!(f, " ]")?;
        writeln!(
            f,
            "less_specifics: {{ {} }}",
            fmt_routes(self.less_specifics.as_deref())
        )?;
        writeln!(
            f,
            "more_specifics: {{ {} }}",
            fmt_routes(self.more_specifics.as_deref())
        )
    }
}

fn fmt_routes(routes: Option<&[Route]>) -> String {
    routes
        .map(|routes| {
            routes
                .iter()
                .map(|r| r.prefix().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}
