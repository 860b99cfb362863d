use std::fmt;

use inetnum::addr::Prefix;

use crate::errors::RibError;

use super::path::{HiddenReason, Path};
use super::selection;

//------------ Route ---------------------------------------------------------

/// A prefix with all the paths a RIB holds for it.
///
/// The paths are kept in selection order, best first. Every method that
/// changes the paths reruns the selection, so the best path and the
/// active set are always consistent with the paths. A route has at most
/// one path per set of attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    prefix: Prefix,
    paths: Vec<Path>,
    ecmp_paths: usize,
}

impl Route {
    /// Create a route without any paths.
    pub fn new(prefix: Prefix) -> Self {
        Self {
            prefix,
            paths: vec![],
            ecmp_paths: 0,
        }
    }

    pub fn with_path(prefix: Prefix, path: Path) -> Self {
        Self::with_paths(prefix, vec![path])
    }

    pub fn with_paths(
        prefix: Prefix,
        paths: impl IntoIterator<Item = Path>,
    ) -> Self {
        let mut route = Self::new(prefix);
        for path in paths {
            route.insert(path);
        }
        route.path_selection();
        route
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    /// All paths, best first, hidden paths last.
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// The number of paths, hidden paths included.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The best path, if the route has any path that is not hidden.
    pub fn best_path(&self) -> Option<&Path> {
        self.paths.first().filter(|p| !p.is_hidden())
    }

    /// The active set: the best path and all paths that are equally good.
    pub fn ecmp_paths(&self) -> &[Path] {
        self.paths.get(..self.ecmp_paths).unwrap_or_default()
    }

    pub fn ecmp_count(&self) -> usize {
        self.ecmp_paths
    }

    /// All paths that are not hidden, in selection order.
    pub fn visible_paths(&self) -> &[Path] {
        let count = self.paths.iter().take_while(|p| !p.is_hidden()).count();
        self.paths.get(..count).unwrap_or_default()
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Add a path. A path with the same attributes is overwritten, so that
    /// its hidden marker and learn time get updated. Returns whether the
    /// path was not present before.
    pub fn add_path(&mut self, path: Path) -> bool {
        let new = self.insert(path);
        self.path_selection();
        new
    }

    pub fn add_paths(&mut self, paths: impl IntoIterator<Item = Path>) {
        for path in paths {
            self.insert(path);
        }
        self.path_selection();
    }

    /// Remove a path. Returns whether the path was present.
    pub fn remove_path(&mut self, path: &Path) -> bool {
        let len = self.paths.len();
        self.paths.retain(|p| p != path);
        let found = self.paths.len() != len;
        if found {
            self.path_selection();
        }
        found
    }

    /// Remove every path of `other` from self. Returns whether self has no
    /// paths left.
    pub fn remove_paths_of(&mut self, other: &Route) -> bool {
        self.paths.retain(|p| !other.paths.contains(p));
        self.path_selection();
        self.paths.is_empty()
    }

    /// Substitute `new` for `old`. Fails if `old` is not a path of this
    /// route.
    pub fn replace_path(
        &mut self,
        old: &Path,
        new: Path,
    ) -> Result<(), RibError> {
        if !self.paths.contains(old) {
            return Err(RibError::PathNotFound);
        }
        self.paths.retain(|p| p != old);
        self.insert(new);
        self.path_selection();
        Ok(())
    }

    /// Replace all paths by `new`, returning the paths that were removed.
    /// A removed path equal to `new` is not returned.
    pub fn replace_all(&mut self, new: Path) -> Vec<Path> {
        let mut old = std::mem::take(&mut self.paths);
        old.retain(|p| p != &new);
        self.paths.push(new);
        self.path_selection();
        old
    }

    /// Set or clear the hidden marker of the path equal to `path`. Returns
    /// whether such a path was found.
    pub fn set_hidden(
        &mut self,
        path: &Path,
        reason: Option<HiddenReason>,
    ) -> bool {
        match self.paths.iter_mut().find(|p| *p == path) {
            Some(p) => {
                p.set_hidden(reason);
                self.path_selection();
                true
            }
            None => false,
        }
    }

    /// Remove and return all paths.
    pub fn take_paths(&mut self) -> Vec<Path> {
        self.ecmp_paths = 0;
        std::mem::take(&mut self.paths)
    }

    /// Sort the paths best first and recompute the active set.
    pub fn path_selection(&mut self) {
        self.ecmp_paths = selection::select(&mut self.paths);
    }

    fn insert(&mut self, path: Path) -> bool {
        match self.paths.iter_mut().find(|p| **p == path) {
            Some(existing) => {
                *existing = path;
                false
            }
            None => {
                self.paths.push(path);
                true
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.prefix)?;
        for (i, path) in self.paths.iter().enumerate() {
            let marker = if i < self.ecmp_paths { "*" } else { " " };
            writeln!(f, "  {} {}", marker, path)?;
        }
        Ok(())
    }
}

/// The paths of `a` that are not in `b`.
pub fn paths_diff(a: &[Path], b: &[Path]) -> Vec<Path> {
    a.iter().filter(|p| !b.contains(p)).cloned().collect()
}
