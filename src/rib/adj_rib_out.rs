use std::sync::Arc;

use inetnum::addr::Prefix;
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::errors::RibError;
use crate::filter::FilterChain;
use crate::route::{Path, Route};
use crate::stats::RibStats;

use super::client::RouteTableClient;
use super::config::{ClientOptions, RibConfig};
use super::core::RibCore;
use super::path_id_manager::PathIdManager;
use super::peer::{should_propagate, PeerInfo};

//------------ AdjRibOut -----------------------------------------------------

/// The RIB of the paths to be sent to a single BGP neighbour.
///
/// An outgoing RIB is registered as a client with the RIB that feeds it,
/// usually a [LocRib](super::LocRib). It drops the paths that must not go
/// to its neighbour: paths learned from the neighbour itself, paths
/// carrying NO_ADVERTISE, and, for an external neighbour, paths carrying
/// NO_EXPORT. The remaining paths run through the export filter chain
/// and are stored as they will be sent. Its own clients, typically the
/// session with the neighbour, are sent the changes.
///
/// Without ADD-PATH send, the neighbour gets one path per prefix and a
/// new path replaces the stored one. With ADD-PATH send, every path gets
/// a path identifier of its own.
pub struct AdjRibOut {
    config: RibConfig,
    peer: PeerInfo,
    inner: RwLock<Inner>,
}

struct Inner {
    core: RibCore,
    export_chain: FilterChain,
    path_ids: PathIdManager,
}

impl AdjRibOut {
    pub fn new(
        config: RibConfig,
        peer: PeerInfo,
        export_chain: FilterChain,
    ) -> Self {
        info!(
            "created outgoing RIB {} for {} (add-path tx {})",
            config.name, peer, config.add_path_tx
        );
        Self {
            inner: RwLock::new(Inner {
                core: RibCore::new(
                    config.name.clone(),
                    FilterChain::default(),
                ),
                export_chain,
                path_ids: PathIdManager::default(),
            }),
            config,
            peer,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn peer(&self) -> &PeerInfo {
        &self.peer
    }

    /// The options to register this RIB with the RIB feeding it: the best
    /// path only, or every path with ADD-PATH send.
    pub fn upstream_options(&self) -> ClientOptions {
        if self.config.add_path_tx {
            ClientOptions::default()
        } else {
            ClientOptions::best()
        }
    }

    fn check_afi(&self, prefix: &Prefix) -> Result<(), RibError> {
        match self.config.afi {
            Some(afi) if !afi.matches(prefix) => {
                Err(RibError::AddressFamilyMismatch)
            }
            _ => Ok(()),
        }
    }

    //-------- Mutations --------------------------------------------------

    /// Store `path` for `prefix`, unless it must not go to the neighbour,
    /// and send the change to the clients.
    pub fn add_path(
        &self,
        prefix: &Prefix,
        path: Path,
    ) -> Result<(), RibError> {
        self.check_afi(prefix)?;
        if !should_propagate(&path, &self.peer) {
            debug!(
                "{}: not sending {} {} to {}",
                self.config.name, prefix, path, self.peer
            );
            return Ok(());
        }

        let mut inner = self.inner.write();
        let Inner {
            core,
            export_chain,
            path_ids,
        } = &mut *inner;

        let (mut path, rejected) = export_chain.process(prefix, path);
        if rejected {
            debug!("{}: {} {} filtered", self.config.name, prefix, path);
            return Ok(());
        }

        let old = core.route_or_empty(prefix);
        if self.config.add_path_tx {
            if let Some(bgp) = path.bgp_mut() {
                if let Some(id) = path_ids.id_of(bgp) {
                    bgp.path_identifier = id;
                }
            }
            if old.contains_path(&path) {
                return Ok(());
            }
            if let Some(bgp) = path.bgp_mut() {
                let id = path_ids.add_path(bgp)?;
                bgp.path_identifier = id;
            }
            core.table.add_path(prefix, path);
        } else {
            core.table.replace_all(prefix, path);
        }

        let new = core.route_or_empty(prefix);
        core.propagate(&old, &new);
        Ok(())
    }

    /// Withdraw `path` for `prefix`. Returns false if the path was never
    /// stored, because it must not go to the neighbour or because it isn't
    /// known.
    pub fn remove_path(&self, prefix: &Prefix, path: &Path) -> bool {
        if !should_propagate(path, &self.peer) {
            return false;
        }

        let mut inner = self.inner.write();
        let Inner {
            core,
            export_chain,
            path_ids,
        } = &mut *inner;

        let (mut path, rejected) = export_chain.process(prefix, path.clone());
        if rejected {
            return false;
        }

        let Some(old) = core.table.get(prefix).cloned() else {
            debug!(
                "{}: remove for unknown prefix {}",
                self.config.name, prefix
            );
            return false;
        };

        if self.config.add_path_tx {
            if let Some(bgp) = path.bgp_mut() {
                if let Some(id) = path_ids.id_of(bgp) {
                    bgp.path_identifier = id;
                }
            }
        }
        if !old.contains_path(&path) {
            debug!(
                "{}: {} does not hold {}",
                self.config.name, prefix, path
            );
            return false;
        }

        core.table.remove_path(prefix, &path);
        if self.config.add_path_tx {
            if let Some(bgp) = path.bgp() {
                if let Err(err) = path_ids.release_path(bgp) {
                    warn!(
                        "{}: releasing the id of {} failed: {}",
                        self.config.name, path, err
                    );
                }
            }
        }

        let new = core.route_or_empty(prefix);
        core.propagate(&old, &new);
        true
    }

    //-------- Clients ----------------------------------------------------

    /// Register `client` to receive every stored path. The client is sent
    /// the current contents of the RIB first. Returns false if the client
    /// was registered already.
    pub fn register(&self, client: Arc<dyn RouteTableClient>) -> bool {
        self.register_with_options(client, ClientOptions::default())
    }

    pub fn register_with_options(
        &self,
        client: Arc<dyn RouteTableClient>,
        options: ClientOptions,
    ) -> bool {
        self.inner.write().core.register(client, options)
    }

    pub fn unregister(&self, client: &Arc<dyn RouteTableClient>) -> bool {
        self.inner.write().core.unregister(client)
    }

    pub fn client_count(&self) -> usize {
        self.inner.read().core.clients.client_count()
    }

    /// Tell every client this RIB is going away, and forget them. The
    /// stored paths are kept.
    pub fn dispose(&self) {
        info!("{}: disposing outgoing RIB", self.config.name);
        self.inner.write().core.dispose();
    }

    //-------- Queries ----------------------------------------------------

    pub fn lpm(&self, prefix: &Prefix) -> Vec<Route> {
        self.inner
            .read()
            .core
            .table
            .lpm(prefix)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn get(&self, prefix: &Prefix) -> Option<Route> {
        self.inner.read().core.table.get(prefix).cloned()
    }

    pub fn get_longer(&self, prefix: &Prefix) -> Vec<Route> {
        self.inner
            .read()
            .core
            .table
            .get_longer(prefix)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn dump(&self) -> Vec<Route> {
        self.inner
            .read()
            .core
            .table
            .dump()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn contains_pfx_path(&self, prefix: &Prefix, path: &Path) -> bool {
        self.inner.read().core.table.contains_pfx_path(prefix, path)
    }

    pub fn route_count(&self) -> i64 {
        self.inner.read().core.table.route_count() as i64
    }

    /// The number of ADD-PATH path identifiers in use.
    pub fn path_ids_in_use(&self) -> usize {
        self.inner.read().path_ids.used()
    }

    pub fn stats(&self) -> RibStats {
        self.inner.read().core.table.stats()
    }
}

impl RouteTableClient for AdjRibOut {
    fn add_path(&self, prefix: &Prefix, path: Path) -> Result<(), RibError> {
        AdjRibOut::add_path(self, prefix, path)
    }

    fn remove_path(&self, prefix: &Prefix, path: &Path) -> bool {
        AdjRibOut::remove_path(self, prefix, path)
    }

    fn replace_path(&self, prefix: &Prefix, old: &Path, new: Path) {
        AdjRibOut::remove_path(self, prefix, old);
        if let Err(err) = AdjRibOut::add_path(self, prefix, new) {
            warn!(
                "{}: replace for {} failed: {}",
                self.config.name, prefix, err
            );
        }
    }

    /// Store the paths this RIB is missing.
    fn refresh_route(&self, prefix: &Prefix, paths: &[Path]) {
        for path in paths {
            if let Err(err) = AdjRibOut::add_path(self, prefix, path.clone()) {
                warn!(
                    "{}: refresh of {} failed: {}",
                    self.config.name, prefix, err
                );
            }
        }
    }

    fn end_of_rib(&self) {
        for reg in self.inner.read().core.clients.clients() {
            reg.client.end_of_rib();
        }
    }

    fn dispose(&self) {
        info!("{}: upstream RIB disposed", self.config.name);
    }
}
