use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use inetnum::addr::Prefix;
use inetnum::asn::Asn;
use parking_lot::Mutex;

use crate::errors::RibError;
use crate::rib::RouteTableClient;
use crate::route::{AsPath, BgpPath, Path};

//------------ ClientEvent ---------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientEvent {
    Add(Prefix, Path),
    InitialAdd(Prefix, Path),
    Remove(Prefix, Path),
    Replace(Prefix, Path, Path),
    Refresh(Prefix, Vec<Path>),
    EndOfRib,
    Dispose,
}

impl ClientEvent {
    pub fn is_add(&self) -> bool {
        matches!(self, ClientEvent::Add(..) | ClientEvent::InitialAdd(..))
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, ClientEvent::Remove(..))
    }
}

//------------ RecordingClient -----------------------------------------------

#[derive(Default)]
struct Recording {
    events: Vec<ClientEvent>,
    held: HashMap<Prefix, Vec<Path>>,
}

/// A client that records every call, and keeps the paths it was sent
/// like a downstream RIB would.
#[derive(Default)]
pub struct RecordingClient {
    inner: Mutex<Recording>,
    reject_adds: bool,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that refuses every advertisement.
    pub fn rejecting() -> Self {
        Self {
            reject_adds: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<ClientEvent> {
        self.inner.lock().events.clone()
    }

    pub fn take_events(&self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.inner.lock().events)
    }

    /// The paths the client currently holds for `prefix`.
    pub fn held(&self, prefix: &Prefix) -> Vec<Path> {
        self.inner
            .lock()
            .held
            .get(prefix)
            .cloned()
            .unwrap_or_default()
    }

    /// The number of paths the client holds over all prefixes.
    pub fn held_count(&self) -> usize {
        self.inner.lock().held.values().map(|p| p.len()).sum()
    }

    fn record_add(
        &self,
        prefix: &Prefix,
        path: Path,
        event: ClientEvent,
    ) -> Result<(), RibError> {
        let mut inner = self.inner.lock();
        inner.events.push(event);
        if self.reject_adds {
            return Err(RibError::ClientRejected(format!("{}", prefix)));
        }
        let held = inner.held.entry(*prefix).or_default();
        held.retain(|p| p != &path);
        held.push(path);
        Ok(())
    }
}

impl RouteTableClient for RecordingClient {
    fn add_path(&self, prefix: &Prefix, path: Path) -> Result<(), RibError> {
        self.record_add(prefix, path.clone(), ClientEvent::Add(*prefix, path))
    }

    fn add_path_initial_dump(
        &self,
        prefix: &Prefix,
        path: Path,
    ) -> Result<(), RibError> {
        let event = ClientEvent::InitialAdd(*prefix, path.clone());
        self.record_add(prefix, path, event)
    }

    fn remove_path(&self, prefix: &Prefix, path: &Path) -> bool {
        let mut inner = self.inner.lock();
        inner.events.push(ClientEvent::Remove(*prefix, path.clone()));
        let Some(held) = inner.held.get_mut(prefix) else {
            return false;
        };
        let len = held.len();
        held.retain(|p| p != path);
        let found = held.len() != len;
        if held.is_empty() {
            inner.held.remove(prefix);
        }
        found
    }

    fn replace_path(&self, prefix: &Prefix, old: &Path, new: Path) {
        let mut inner = self.inner.lock();
        inner
            .events
            .push(ClientEvent::Replace(*prefix, old.clone(), new.clone()));
        let held = inner.held.entry(*prefix).or_default();
        held.retain(|p| p != old);
        held.push(new);
    }

    fn refresh_route(&self, prefix: &Prefix, paths: &[Path]) {
        let mut inner = self.inner.lock();
        inner
            .events
            .push(ClientEvent::Refresh(*prefix, paths.to_vec()));
        if paths.is_empty() {
            inner.held.remove(prefix);
        } else {
            inner.held.insert(*prefix, paths.to_vec());
        }
    }

    fn end_of_rib(&self) {
        self.inner.lock().events.push(ClientEvent::EndOfRib);
    }

    fn dispose(&self) {
        self.inner.lock().events.push(ClientEvent::Dispose);
    }
}

//------------ Path helpers --------------------------------------------------

/// A BGP path through `asns` with local preference `local_pref`, learned
/// from `source`.
pub fn bgp_path(local_pref: u32, source: Ipv4Addr, asns: &[u32]) -> Path {
    Path::new_bgp(BgpPath {
        local_pref,
        next_hop: IpAddr::V4(source),
        source: IpAddr::V4(source),
        as_path: AsPath::from_sequence(
            asns.iter().map(|asn| Asn::from_u32(*asn)),
        ),
        ..Default::default()
    })
}

pub fn static_path(next_hop: Ipv4Addr) -> Path {
    Path::new_static(IpAddr::V4(next_hop))
}
