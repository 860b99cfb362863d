use std::sync::Arc;

use inetnum::addr::Prefix;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;

use crate::errors::RibError;
use crate::filter::FilterChain;
use crate::match_options::{MatchOptions, QueryResult};
use crate::route::{Path, Route};
use crate::stats::RibStats;

use super::client::RouteTableClient;
use super::config::{ClientOptions, RibConfig};
use super::contributing_asns::ContributingAsns;
use super::core::RibCore;

//------------ LocRib --------------------------------------------------------

/// The local RIB: all paths learned for a prefix, from all sources, with
/// the selection applied.
///
/// Every change to a route is propagated to the registered clients as the
/// difference between what each client saw before and after the change.
/// The write lock is held while the clients are called, so clients see
/// the changes of a single RIB in order.
///
/// A local RIB is itself a [RouteTableClient], so it can be registered
/// with another RIB.
pub struct LocRib {
    config: RibConfig,
    core: RwLock<RibCore>,
    count_target: Mutex<Option<CountTarget>>,
    contributing_asns: ContributingAsns,
}

struct CountTarget {
    count: usize,
    tx: oneshot::Sender<()>,
}

impl LocRib {
    pub fn new(config: RibConfig) -> Self {
        info!(
            "created local RIB {} (afi {})",
            config.name,
            config
                .afi
                .map(|afi| afi.to_string())
                .unwrap_or_else(|| "any".to_string())
        );
        Self {
            core: RwLock::new(RibCore::new(
                config.name.clone(),
                FilterChain::default(),
            )),
            config,
            count_target: Mutex::new(None),
            contributing_asns: ContributingAsns::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &RibConfig {
        &self.config
    }

    pub fn contributing_asns(&self) -> &ContributingAsns {
        &self.contributing_asns
    }

    fn check_afi(&self, prefix: &Prefix) -> Result<(), RibError> {
        match self.config.afi {
            Some(afi) if !afi.matches(prefix) => {
                warn!(
                    "{}: rejecting {}, RIB is {} only",
                    self.config.name, prefix, afi
                );
                Err(RibError::AddressFamilyMismatch)
            }
            _ => Ok(()),
        }
    }

    //-------- Mutations --------------------------------------------------

    /// Add `path` to the route of `prefix`, creating the route if needed.
    /// A path equal to a stored path replaces it.
    pub fn add_path(
        &self,
        prefix: &Prefix,
        path: Path,
    ) -> Result<(), RibError> {
        self.check_afi(prefix)?;
        debug!("{}: add path {} {}", self.config.name, prefix, path);

        let route_count = {
            let mut core = self.core.write();
            let old = core.route_or_empty(prefix);
            core.table.add_path(prefix, path);
            let new = core.route_or_empty(prefix);
            core.propagate(&old, &new);
            core.table.route_count()
        };

        self.check_count_target(route_count);
        Ok(())
    }

    /// Remove `path` from the route of `prefix`. Removing from a prefix
    /// the RIB doesn't hold is not an error, so this always returns true.
    pub fn remove_path(&self, prefix: &Prefix, path: &Path) -> bool {
        debug!("{}: remove path {} {}", self.config.name, prefix, path);
        let mut core = self.core.write();

        let Some(old) = core.table.get(prefix).cloned() else {
            debug!(
                "{}: remove for unknown prefix {}",
                self.config.name, prefix
            );
            return true;
        };

        if !core.table.remove_path(prefix, path) {
            debug!("{}: {} has no path {}", self.config.name, prefix, path);
            return true;
        }
        let new = core.route_or_empty(prefix);
        core.propagate(&old, &new);
        true
    }

    /// Substitute `new` for `old` in the route of `prefix`. Does nothing,
    /// apart from logging a warning, if the RIB doesn't hold `old`.
    pub fn replace_path(&self, prefix: &Prefix, old: &Path, new: Path) {
        let mut core = self.core.write();

        let Some(before) = core.table.get(prefix).cloned() else {
            warn!(
                "{}: replace for unknown prefix {}",
                self.config.name, prefix
            );
            return;
        };

        if let Err(err) = core.table.replace_path(prefix, old, new) {
            warn!(
                "{}: replace for {} failed: {}",
                self.config.name, prefix, err
            );
            return;
        }
        let after = core.route_or_empty(prefix);
        core.propagate(&before, &after);
    }

    //-------- Clients ----------------------------------------------------

    /// Register `client` to receive the best path of every route. The
    /// client is sent the current contents of the RIB first. Returns false
    /// if the client was registered already.
    pub fn register(&self, client: Arc<dyn RouteTableClient>) -> bool {
        self.register_with_options(client, ClientOptions::best())
    }

    pub fn register_with_options(
        &self,
        client: Arc<dyn RouteTableClient>,
        options: ClientOptions,
    ) -> bool {
        self.core.write().register(client, options)
    }

    /// Withdraw every path `client` holds from this RIB and stop sending
    /// it updates. Returns false if the client wasn't registered.
    pub fn unregister(&self, client: &Arc<dyn RouteTableClient>) -> bool {
        self.core.write().unregister(client)
    }

    /// Send `client` the current contents of the RIB, as an initial dump
    /// followed by an end-of-RIB. A client that isn't registered gets the
    /// best paths.
    pub fn update_new_client(
        &self,
        client: Arc<dyn RouteTableClient>,
    ) -> Result<(), RibError> {
        let core = self.core.write();
        let options = core
            .clients
            .options_of(&client)
            .unwrap_or_else(ClientOptions::best);
        core.dump_to(&client, &options)
    }

    /// Send a registered client the complete current view of every route.
    pub fn refresh_client(&self, client: &Arc<dyn RouteTableClient>) {
        let core = self.core.write();
        match core.clients.options_of(client) {
            Some(options) => core.refresh(client, &options),
            None => {
                debug!("{}: refresh of unknown client", self.config.name)
            }
        }
    }

    pub fn client_count(&self) -> usize {
        self.core.read().clients.client_count()
    }

    /// Tell every client this RIB is going away, and forget them. Clients
    /// are not sent withdrawals. The routes are kept.
    pub fn dispose(&self) {
        info!("{}: disposing local RIB", self.config.name);
        self.core.write().dispose();
        self.count_target.lock().take();
    }

    //-------- Route count watch ------------------------------------------

    /// Signal `tx` once the RIB holds at least `count` routes. Fires
    /// immediately if it already does. A target set earlier that hasn't
    /// fired yet is dropped.
    pub fn set_count_target(&self, count: usize, tx: oneshot::Sender<()>) {
        *self.count_target.lock() = Some(CountTarget { count, tx });
        let route_count = self.core.read().table.route_count();
        self.check_count_target(route_count);
    }

    fn check_count_target(&self, route_count: usize) {
        let mut target = self.count_target.lock();
        if !target.as_ref().is_some_and(|t| route_count >= t.count) {
            return;
        }
        if let Some(t) = target.take() {
            debug!(
                "{}: route count {} reached target {}",
                self.config.name, route_count, t.count
            );
            // The receiver may be gone, nobody is waiting then.
            let _ = t.tx.send(());
        }
    }

    //-------- Queries ----------------------------------------------------

    /// All routes covering `prefix`, least specific first. Includes the
    /// route for `prefix` itself if it exists.
    pub fn lpm(&self, prefix: &Prefix) -> Vec<Route> {
        self.core.read().table.lpm(prefix).into_iter().cloned().collect()
    }

    pub fn get(&self, prefix: &Prefix) -> Option<Route> {
        self.core.read().table.get(prefix).cloned()
    }

    /// The route for `prefix` and all its more-specifics. `prefix` itself
    /// doesn't need to be present.
    pub fn get_longer(&self, prefix: &Prefix) -> Vec<Route> {
        self.core
            .read()
            .table
            .get_longer(prefix)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn match_prefix(
        &self,
        prefix: &Prefix,
        options: &MatchOptions,
    ) -> QueryResult {
        self.core.read().table.match_prefix(prefix, options)
    }

    pub fn dump(&self) -> Vec<Route> {
        self.core.read().table.dump().into_iter().cloned().collect()
    }

    pub fn contains_pfx_path(&self, prefix: &Prefix, path: &Path) -> bool {
        self.core.read().table.contains_pfx_path(prefix, path)
    }

    pub fn route_count(&self) -> i64 {
        self.core.read().table.route_count() as i64
    }

    pub fn stats(&self) -> RibStats {
        self.core.read().table.stats()
    }
}

impl RouteTableClient for LocRib {
    fn add_path(&self, prefix: &Prefix, path: Path) -> Result<(), RibError> {
        LocRib::add_path(self, prefix, path)
    }

    fn remove_path(&self, prefix: &Prefix, path: &Path) -> bool {
        LocRib::remove_path(self, prefix, path)
    }

    fn replace_path(&self, prefix: &Prefix, old: &Path, new: Path) {
        LocRib::replace_path(self, prefix, old, new)
    }

    /// Add the paths this RIB is missing. Paths this RIB has that are not
    /// in `paths` are left alone, they may have come from another RIB.
    fn refresh_route(&self, prefix: &Prefix, paths: &[Path]) {
        for path in paths {
            if self.contains_pfx_path(prefix, path) {
                continue;
            }
            if let Err(err) = LocRib::add_path(self, prefix, path.clone()) {
                warn!(
                    "{}: refresh of {} failed: {}",
                    self.config.name, prefix, err
                );
            }
        }
    }

    fn end_of_rib(&self) {
        debug!("{}: end of RIB from upstream", self.config.name);
    }

    fn dispose(&self) {
        info!("{}: upstream RIB disposed", self.config.name);
    }
}
