use inetnum::addr::Prefix;

use crate::errors::RibError;
use crate::route::Path;

//------------ RouteTableClient ----------------------------------------------

/// A consumer of the updates of a RIB.
///
/// Clients are called synchronously, while the RIB holds its write lock.
/// A client that is slow holds up every writer of the RIB. A client must
/// never call back into the RIB that is calling it.
///
/// The RIBs themselves are clients, so that a RIB can be fed by another
/// RIB.
pub trait RouteTableClient: Send + Sync {
    /// A path became visible to this client.
    fn add_path(&self, prefix: &Prefix, path: Path) -> Result<(), RibError>;

    /// A path sent as part of the initial dump after registration. The
    /// dump ends with a call to `end_of_rib`.
    fn add_path_initial_dump(
        &self,
        prefix: &Prefix,
        path: Path,
    ) -> Result<(), RibError> {
        self.add_path(prefix, path)
    }

    /// A path that was sent earlier is no longer visible to this client.
    /// Returns `false` if the client did not know the path.
    fn remove_path(&self, prefix: &Prefix, path: &Path) -> bool;

    /// A path that was sent earlier has been modified.
    fn replace_path(&self, prefix: &Prefix, old: &Path, new: Path);

    /// The complete set of paths for `prefix` the RIB currently shows this
    /// client, sent without diffing.
    fn refresh_route(&self, prefix: &Prefix, paths: &[Path]);

    /// The initial dump has been sent completely.
    fn end_of_rib(&self) {}

    /// The RIB is going away, no updates will follow.
    fn dispose(&self) {}
}
