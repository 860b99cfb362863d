use std::sync::Arc;

use inetnum::addr::Prefix;
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::errors::RibError;
use crate::filter::FilterChain;
use crate::match_options::{MatchOptions, QueryResult};
use crate::route::{HiddenReason, Path, Route};
use crate::stats::RibStats;

use super::client::RouteTableClient;
use super::config::{ClientOptions, RibConfig};
use super::core::{exported, exposure, RibCore};

// The hidden marker a path should carry after the policy has (not)
// rejected it. Markers set for other reasons are left alone.
fn policy_marker(
    current: Option<HiddenReason>,
    rejected: bool,
) -> Option<HiddenReason> {
    match (current, rejected) {
        (None, true) => Some(HiddenReason::FilteredByPolicy),
        (Some(HiddenReason::FilteredByPolicy), false) => None,
        (current, _) => current,
    }
}

//------------ AdjRibIn ------------------------------------------------------

/// The RIB of the paths received from a single peer.
///
/// Paths are stored as received. A path the filter chain rejects is kept,
/// marked hidden, so that a later change of the chain can bring it back
/// without the peer having to send it again. Clients only see paths that
/// pass the chain, with the modifications the chain made.
///
/// Without ADD-PATH receive a peer has at most one path per prefix, and
/// every new path replaces the stored one. With ADD-PATH receive, paths
/// are told apart by their path identifier.
pub struct AdjRibIn {
    config: RibConfig,
    core: RwLock<RibCore>,
}

impl AdjRibIn {
    pub fn new(config: RibConfig, filter_chain: FilterChain) -> Self {
        info!(
            "created received RIB {} (add-path rx {}, {} filters)",
            config.name,
            config.add_path_rx,
            filter_chain.filters().len()
        );
        Self {
            core: RwLock::new(RibCore::new(config.name.clone(), filter_chain)),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &RibConfig {
        &self.config
    }

    pub fn filter_chain(&self) -> FilterChain {
        self.core.read().filter_chain.clone()
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

    /// Store `path` for `prefix` and propagate the change. The path
    /// replaces the stored path of the prefix, or with ADD-PATH receive,
    /// the stored path with the same path identifier.
    pub fn add_path(
        &self,
        prefix: &Prefix,
        path: Path,
    ) -> Result<(), RibError> {
        self.check_afi(prefix)?;
        let mut core = self.core.write();

        let mut path = path;
        let (_, rejected) = core.filter_chain.process(prefix, path.clone());
        if rejected {
            debug!("{}: {} {} filtered", self.config.name, prefix, path);
        }
        path.set_hidden(policy_marker(path.hidden_reason, rejected));

        let old = core.route_or_empty(prefix);
        if self.config.add_path_rx {
            let id = path.path_identifier();
            for stale in old
                .paths()
                .iter()
                .filter(|p| p.path_identifier() == id && **p != path)
            {
                core.table.remove_path(prefix, stale);
            }
            core.table.add_path(prefix, path);
        } else {
            core.table.replace_all(prefix, path);
        }

        let new = core.route_or_empty(prefix);
        core.propagate(&old, &new);
        Ok(())
    }

    /// Withdraw `path` for `prefix`. Without ADD-PATH receive, this
    /// withdraws the prefix, whatever the attributes of `path`. With
    /// ADD-PATH receive, the stored path with the same path identifier is
    /// withdrawn. Returns false if a known prefix has no matching path.
    pub fn remove_path(&self, prefix: &Prefix, path: &Path) -> bool {
        let mut core = self.core.write();

        let Some(old) = core.table.get(prefix).cloned() else {
            debug!(
                "{}: remove for unknown prefix {}",
                self.config.name, prefix
            );
            return true;
        };

        if self.config.add_path_rx {
            let id = path.path_identifier();
            let stale: Vec<Path> = old
                .paths()
                .iter()
                .filter(|p| p.path_identifier() == id)
                .cloned()
                .collect();
            if stale.is_empty() {
                debug!(
                    "{}: {} has no path with id {}",
                    self.config.name, prefix, id
                );
                return false;
            }
            for p in &stale {
                core.table.remove_path(prefix, p);
            }
        } else {
            core.table.remove_prefix(prefix);
        }

        let new = core.route_or_empty(prefix);
        core.propagate(&old, &new);
        true
    }

    /// Substitute `new` for `old`, with the policy applied to `new`. Does
    /// nothing, apart from logging a warning, if `old` isn't stored.
    pub fn replace_path(&self, prefix: &Prefix, old: &Path, new: Path) {
        let mut core = self.core.write();

        let Some(before) = core.table.get(prefix).cloned() else {
            warn!(
                "{}: replace for unknown prefix {}",
                self.config.name, prefix
            );
            return;
        };

        let mut new = new;
        let (_, rejected) = core.filter_chain.process(prefix, new.clone());
        new.set_hidden(policy_marker(new.hidden_reason, rejected));

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

    /// Install a new filter chain and re-evaluate every stored path.
    ///
    /// Per path and client, a path that is now rejected is withdrawn, a
    /// path that is now accepted is advertised, and an accepted path that
    /// the new chain modifies differently is replaced. All withdrawals go
    /// out before the first advertisement or replacement.
    pub fn replace_filter_chain(&self, chain: FilterChain) {
        info!(
            "{}: replacing filter chain ({} filters)",
            self.config.name,
            chain.filters().len()
        );
        let mut core = self.core.write();
        let old_chain = std::mem::replace(&mut core.filter_chain, chain);

        let before: Vec<Route> =
            core.table.dump().into_iter().cloned().collect();

        let RibCore {
            table,
            filter_chain,
            ..
        } = &mut *core;
        table.for_each_route_mut(|route| {
            let prefix = route.prefix();
            let changed: Vec<(Path, Option<HiddenReason>)> = route
                .paths()
                .iter()
                .filter_map(|p| {
                    let (_, rejected) =
                        filter_chain.process(&prefix, p.clone());
                    let marker = policy_marker(p.hidden_reason, rejected);
                    (marker != p.hidden_reason).then(|| (p.clone(), marker))
                })
                .collect();
            for (path, marker) in changed {
                route.set_hidden(&path, marker);
            }
        });

        let mut withdrawals = vec![];
        let mut updates = vec![];
        for reg in core.clients.clients() {
            for old_route in &before {
                let prefix = old_route.prefix();
                let new_route = core.route_or_empty(&prefix);
                let old_view = exposure(old_route, &reg.options, &old_chain);
                let new_view =
                    exposure(&new_route, &reg.options, &core.filter_chain);

                for (stored, old_exp) in &old_view {
                    match new_view.iter().find(|(s, _)| s == stored) {
                        None => withdrawals.push((
                            reg.client.clone(),
                            prefix,
                            old_exp.clone(),
                        )),
                        Some((_, new_exp)) if new_exp != old_exp => updates
                            .push(Update::Replace(
                                reg.client.clone(),
                                prefix,
                                old_exp.clone(),
                                new_exp.clone(),
                            )),
                        Some(_) => {}
                    }
                }
                for (stored, new_exp) in &new_view {
                    if !old_view.iter().any(|(s, _)| s == stored) {
                        updates.push(Update::Add(
                            reg.client.clone(),
                            prefix,
                            new_exp.clone(),
                        ));
                    }
                }
            }
        }

        for (client, prefix, path) in withdrawals {
            if !client.remove_path(&prefix, &path) {
                debug!(
                    "{}: client did not hold {} {}",
                    self.config.name, prefix, path
                );
            }
        }
        for update in updates {
            match update {
                Update::Add(client, prefix, path) => {
                    core.add_to_client(&client, &prefix, path)
                }
                Update::Replace(client, prefix, old, new) => {
                    client.replace_path(&prefix, &old, new)
                }
            }
        }
    }

    /// Withdraw every path from every client and empty the RIB.
    pub fn flush(&self) {
        info!("{}: flushing", self.config.name);
        let mut core = self.core.write();
        let routes = core.table.drain();
        for route in &routes {
            core.propagate(route, &Route::new(route.prefix()));
        }
    }

    //-------- Clients ----------------------------------------------------

    /// Register `client` to receive every path that passes the filter
    /// chain. The client is sent the current contents of the RIB first.
    /// Returns false if the client was registered already.
    pub fn register(&self, client: Arc<dyn RouteTableClient>) -> bool {
        self.register_with_options(client, ClientOptions::default())
    }

    pub fn register_with_options(
        &self,
        client: Arc<dyn RouteTableClient>,
        options: ClientOptions,
    ) -> bool {
        self.core.write().register(client, options)
    }

    pub fn unregister(&self, client: &Arc<dyn RouteTableClient>) -> bool {
        self.core.write().unregister(client)
    }

    pub fn update_new_client(
        &self,
        client: Arc<dyn RouteTableClient>,
    ) -> Result<(), RibError> {
        let core = self.core.write();
        let options = core.clients.options_of(&client).unwrap_or_default();
        core.dump_to(&client, &options)
    }

    pub fn refresh_client(&self, client: &Arc<dyn RouteTableClient>) {
        let core = self.core.write();
        let options = core.clients.options_of(client).unwrap_or_default();
        core.refresh(client, &options);
    }

    pub fn client_count(&self) -> usize {
        self.core.read().clients.client_count()
    }

    /// Tell every client this RIB is going away, and forget them. The
    /// routes are kept, use [flush](Self::flush) to withdraw them.
    pub fn dispose(&self) {
        info!("{}: disposing received RIB", self.config.name);
        self.core.write().dispose();
    }

    //-------- Queries ----------------------------------------------------

    /// The routes covering `prefix`, least specific first. Hidden paths
    /// are included, they are part of the stored routes.
    pub fn lpm(&self, prefix: &Prefix) -> Vec<Route> {
        self.core.read().table.lpm(prefix).into_iter().cloned().collect()
    }

    pub fn get(&self, prefix: &Prefix) -> Option<Route> {
        self.core.read().table.get(prefix).cloned()
    }

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

    /// The paths of `prefix` as a client with `options` sees them, after
    /// the filter chain.
    pub fn exported_paths(
        &self,
        prefix: &Prefix,
        options: &ClientOptions,
    ) -> Vec<Path> {
        let core = self.core.read();
        core.table
            .get(prefix)
            .map(|route| exported(route, options, &core.filter_chain))
            .unwrap_or_default()
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

enum Update {
    Add(Arc<dyn RouteTableClient>, Prefix, Path),
    Replace(Arc<dyn RouteTableClient>, Prefix, Path, Path),
}

impl RouteTableClient for AdjRibIn {
    fn add_path(&self, prefix: &Prefix, path: Path) -> Result<(), RibError> {
        AdjRibIn::add_path(self, prefix, path)
    }

    fn remove_path(&self, prefix: &Prefix, path: &Path) -> bool {
        AdjRibIn::remove_path(self, prefix, path)
    }

    fn replace_path(&self, prefix: &Prefix, old: &Path, new: Path) {
        AdjRibIn::replace_path(self, prefix, old, new)
    }

    /// Store the paths this RIB is missing.
    fn refresh_route(&self, prefix: &Prefix, paths: &[Path]) {
        for path in paths {
            if self.contains_pfx_path(prefix, path) {
                continue;
            }
            if let Err(err) = AdjRibIn::add_path(self, prefix, path.clone()) {
                warn!(
                    "{}: refresh of {} failed: {}",
                    self.config.name, prefix, err
                );
            }
        }
    }
}
