use std::sync::Arc;

use inetnum::addr::Prefix;
use log::{debug, error, warn};

use crate::errors::RibError;
use crate::filter::FilterChain;
use crate::route::{paths_diff, Path, Route};
use crate::trie::table::RoutingTable;

use super::client::RouteTableClient;
use super::client_manager::ClientManager;
use super::config::ClientOptions;
use super::peer::should_propagate;

//------------ Exposure ------------------------------------------------------

/// The paths of `route` a client with `options` gets to see, as pairs of
/// the stored path and the path after it went through `chain`.
///
/// Hidden paths are never exposed. The visible paths are taken best first,
/// as many as the options allow, and the ones the chain rejects are
/// dropped. For a client that feeds a BGP neighbour, the paths that must
/// not go to that neighbour are dropped last.
pub(crate) fn exposure(
    route: &Route,
    options: &ClientOptions,
    chain: &FilterChain,
) -> Vec<(Path, Path)> {
    let visible = route.visible_paths();
    let max = options.max_paths(route.ecmp_count()).min(visible.len());
    let prefix = route.prefix();

    visible
        .iter()
        .take(max)
        .filter_map(|stored| {
            let (exported, reject) = chain.process(&prefix, stored.clone());
            (!reject).then(|| (stored.clone(), exported))
        })
        .filter(|(_, exported)| {
            options
                .peer
                .map_or(true, |peer| should_propagate(exported, &peer))
        })
        .collect()
}

pub(crate) fn exported(
    route: &Route,
    options: &ClientOptions,
    chain: &FilterChain,
) -> Vec<Path> {
    exposure(route, options, chain)
        .into_iter()
        .map(|(_, exported)| exported)
        .collect()
}

//------------ RibCore -------------------------------------------------------

/// The state shared by both RIB flavours: the routes, the clients and the
/// policy applied on the way out. A RIB keeps its core behind a single
/// lock, and clients are called while that lock is held.
pub(crate) struct RibCore {
    pub name: String,
    pub table: RoutingTable,
    pub clients: ClientManager,
    pub filter_chain: FilterChain,
}

impl RibCore {
    pub fn new(name: String, filter_chain: FilterChain) -> Self {
        Self {
            name,
            table: RoutingTable::new(),
            clients: ClientManager::default(),
            filter_chain,
        }
    }

    /// The stored route for `prefix`, or an empty route.
    pub fn route_or_empty(&self, prefix: &Prefix) -> Route {
        self.table
            .get(prefix)
            .cloned()
            .unwrap_or_else(|| Route::new(*prefix))
    }

    /// Send every client the difference between what it saw of `old` and
    /// what it sees of `new`. All withdrawals, for all clients, go out
    /// before the first advertisement.
    pub fn propagate(&self, old: &Route, new: &Route) {
        let prefix = new.prefix();
        let mut advertisements = vec![];

        for reg in self.clients.clients() {
            let before = exported(old, &reg.options, &self.filter_chain);
            let after = exported(new, &reg.options, &self.filter_chain);

            for path in paths_diff(&before, &after) {
                if !reg.client.remove_path(&prefix, &path) {
                    debug!(
                        "{}: client did not hold {} {}",
                        self.name, prefix, path
                    );
                }
            }

            let added = paths_diff(&after, &before);
            if !added.is_empty() {
                advertisements.push((reg.client.clone(), added));
            }
        }

        for (client, paths) in advertisements {
            for path in paths {
                self.add_to_client(&client, &prefix, path);
            }
        }
    }

    pub fn add_to_client(
        &self,
        client: &Arc<dyn RouteTableClient>,
        prefix: &Prefix,
        path: Path,
    ) {
        if let Err(err) = client.add_path(prefix, path) {
            error!(
                "{}: could not add {} to client: {}",
                self.name, prefix, err
            );
        }
    }

    /// Send `client` everything it may see, followed by an end-of-RIB.
    /// Returns the first error the client reported, after the dump has
    /// completed.
    pub fn dump_to(
        &self,
        client: &Arc<dyn RouteTableClient>,
        options: &ClientOptions,
    ) -> Result<(), RibError> {
        let mut res = Ok(());
        for route in self.table.dump() {
            let prefix = route.prefix();
            for path in exported(route, options, &self.filter_chain) {
                if let Err(err) = client.add_path_initial_dump(&prefix, path)
                {
                    error!(
                        "{}: initial dump of {} failed: {}",
                        self.name, prefix, err
                    );
                    if res.is_ok() {
                        res = Err(err);
                    }
                }
            }
        }
        client.end_of_rib();
        res
    }

    /// Withdraw from `client` every path it was shown.
    pub fn withdraw_from(
        &self,
        client: &Arc<dyn RouteTableClient>,
        options: &ClientOptions,
    ) {
        for route in self.table.dump() {
            let prefix = route.prefix();
            for path in exported(route, options, &self.filter_chain) {
                if !client.remove_path(&prefix, &path) {
                    debug!(
                        "{}: client did not hold {} {}",
                        self.name, prefix, path
                    );
                }
            }
        }
    }

    /// Register `client` and send it the initial dump. A client that was
    /// registered already only gets its options updated, it is not sent
    /// the dump again.
    pub fn register(
        &mut self,
        client: Arc<dyn RouteTableClient>,
        options: ClientOptions,
    ) -> bool {
        if !self.clients.register(client.clone(), options) {
            return false;
        }
        debug!("{}: registered client, sending initial dump", self.name);
        if self.dump_to(&client, &options).is_err() {
            warn!("{}: initial dump to new client incomplete", self.name);
        }
        true
    }

    /// Withdraw everything `client` was shown, then forget it.
    pub fn unregister(&mut self, client: &Arc<dyn RouteTableClient>) -> bool {
        let Some(options) = self.clients.options_of(client) else {
            debug!("{}: unregister of unknown client", self.name);
            return false;
        };
        self.withdraw_from(client, &options);
        self.clients.unregister(client)
    }

    /// Tell all clients the RIB is going away and forget them. Nothing is
    /// withdrawn.
    pub fn dispose(&mut self) {
        for reg in self.clients.drain() {
            reg.client.dispose();
        }
    }

    /// Send `client` the complete current view of every route.
    pub fn refresh(
        &self,
        client: &Arc<dyn RouteTableClient>,
        options: &ClientOptions,
    ) {
        for route in self.table.dump() {
            let paths = exported(route, options, &self.filter_chain);
            client.refresh_route(&route.prefix(), &paths);
        }
    }
}
