use std::sync::Arc;

use log::debug;

use super::client::RouteTableClient;
use super::config::ClientOptions;

//------------ ClientManager -------------------------------------------------

/// The clients registered with a RIB, in registration order.
///
/// A client is identified by the allocation its `Arc` points to, so the
/// same client registered through two clones of one `Arc` is a single
/// registration. The manager only keeps the list, the owning RIB sends
/// the initial dump and the withdrawals.
#[derive(Default)]
pub(crate) struct ClientManager {
    clients: Vec<Registration>,
}

#[derive(Clone)]
pub(crate) struct Registration {
    pub client: Arc<dyn RouteTableClient>,
    pub options: ClientOptions,
}

fn same_client(
    a: &Arc<dyn RouteTableClient>,
    b: &Arc<dyn RouteTableClient>,
) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl ClientManager {
    /// Register `client`. Returns false if it was registered already, in
    /// which case only its options are updated.
    pub fn register(
        &mut self,
        client: Arc<dyn RouteTableClient>,
        options: ClientOptions,
    ) -> bool {
        if let Some(reg) =
            self.clients.iter_mut().find(|r| same_client(&r.client, &client))
        {
            debug!("client already registered, updating options");
            reg.options = options;
            return false;
        }
        self.clients.push(Registration { client, options });
        true
    }

    /// Returns whether the client was registered.
    pub fn unregister(&mut self, client: &Arc<dyn RouteTableClient>) -> bool {
        let len = self.clients.len();
        self.clients.retain(|r| !same_client(&r.client, client));
        self.clients.len() != len
    }

    pub fn options_of(
        &self,
        client: &Arc<dyn RouteTableClient>,
    ) -> Option<ClientOptions> {
        self.clients
            .iter()
            .find(|r| same_client(&r.client, client))
            .map(|r| r.options)
    }

    /// A snapshot of the registrations, in registration order. Changes to
    /// the manager don't affect a snapshot taken earlier.
    pub fn clients(&self) -> Vec<Registration> {
        self.clients.clone()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn drain(&mut self) -> Vec<Registration> {
        std::mem::take(&mut self.clients)
    }
}
