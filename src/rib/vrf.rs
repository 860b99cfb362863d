//! Routing instances.
//!
//! A [Vrf] groups the local RIBs of one routing instance, one per address
//! family. The [VrfRegistry] holds all instances of an application by
//! name. There is no global registry, the application creates one and
//! hands it to whatever needs to look up an instance.

use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use parking_lot::{Mutex, RwLock};

use crate::errors::RibError;

use super::config::{Afi, RibConfig};
use super::loc_rib::LocRib;

pub const IPV4_UNICAST_RIB: &str = "inet.0";
pub const IPV6_UNICAST_RIB: &str = "inet6.0";

//------------ Route distinguisher -------------------------------------------

/// Format a route distinguisher as `ASN:ID`, from the upper and lower 32
/// bits respectively.
pub fn route_distinguisher_to_string(rd: u64) -> String {
    format!("{}:{}", rd >> 32, rd & 0xffff_ffff)
}

/// Parse a route distinguisher in the `ASN:ID` format. Both parts must fit
/// in 32 bits.
pub fn parse_route_distinguisher(s: &str) -> Result<u64, RibError> {
    let (asn, id) = s.split_once(':').ok_or_else(|| {
        RibError::InvalidRouteDistinguisher(format!("'{}' is not ASN:ID", s))
    })?;
    let invalid = |part: &str, value: &str, err: std::num::ParseIntError| {
        RibError::InvalidRouteDistinguisher(format!(
            "{} '{}': {}",
            part, value, err
        ))
    };
    let asn = asn.parse::<u32>().map_err(|err| invalid("ASN", asn, err))?;
    let id = id.parse::<u32>().map_err(|err| invalid("ID", id, err))?;
    Ok((u64::from(asn) << 32) | u64::from(id))
}

//------------ Vrf -----------------------------------------------------------

#[derive(Default)]
struct VrfRibs {
    by_afi: HashMap<Afi, Arc<LocRib>>,
    by_name: HashMap<String, Arc<LocRib>>,
}

/// A routing instance: a name, a route distinguisher and a local RIB per
/// address family.
pub struct Vrf {
    name: String,
    rd: u64,
    ribs: Mutex<VrfRibs>,
}

impl Vrf {
    /// Create a VRF with an IPv4 unicast RIB named `inet.0` and an IPv6
    /// unicast RIB named `inet6.0`. The VRF is not registered anywhere.
    pub fn new(name: impl Into<String>, rd: u64) -> Self {
        let vrf = Self::empty(name, rd);
        {
            let mut ribs = vrf.ribs.lock();
            for (rib_name, afi) in
                [(IPV4_UNICAST_RIB, Afi::Ipv4), (IPV6_UNICAST_RIB, Afi::Ipv6)]
            {
                let rib = Arc::new(Self::new_rib(rib_name, afi));
                ribs.by_afi.insert(afi, rib.clone());
                ribs.by_name.insert(rib_name.to_string(), rib);
            }
        }
        vrf
    }

    /// Create a VRF without any RIBs.
    pub fn empty(name: impl Into<String>, rd: u64) -> Self {
        let name = name.into();
        info!(
            "created VRF {} rd {}",
            name,
            route_distinguisher_to_string(rd)
        );
        Self {
            name,
            rd,
            ribs: Mutex::new(VrfRibs::default()),
        }
    }

    fn new_rib(name: &str, afi: Afi) -> LocRib {
        LocRib::new(RibConfig {
            name: name.to_string(),
            afi: Some(afi),
            ..Default::default()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn route_distinguisher(&self) -> u64 {
        self.rd
    }

    /// Create a local RIB for `afi`. The RIB becomes the RIB of the family,
    /// replacing an earlier one for lookups by family. Fails if the VRF has
    /// a RIB with this name already.
    pub fn create_loc_rib(
        &self,
        name: &str,
        afi: Afi,
    ) -> Result<Arc<LocRib>, RibError> {
        let mut ribs = self.ribs.lock();
        if ribs.by_name.contains_key(name) {
            return Err(RibError::RibExists(name.to_string()));
        }
        let rib = Arc::new(Self::new_rib(name, afi));
        ribs.by_afi.insert(afi, rib.clone());
        ribs.by_name.insert(name.to_string(), rib.clone());
        Ok(rib)
    }

    pub fn ipv4_unicast_rib(&self) -> Option<Arc<LocRib>> {
        self.ribs.lock().by_afi.get(&Afi::Ipv4).cloned()
    }

    pub fn ipv6_unicast_rib(&self) -> Option<Arc<LocRib>> {
        self.ribs.lock().by_afi.get(&Afi::Ipv6).cloned()
    }

    pub fn rib_by_name(&self, name: &str) -> Option<Arc<LocRib>> {
        self.ribs.lock().by_name.get(name).cloned()
    }

    /// The names of all RIBs of the VRF, sorted.
    pub fn rib_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.ribs.lock().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Dispose all RIBs and drop them from the VRF.
    pub fn dispose(&self) {
        info!("disposing VRF {}", self.name);
        let ribs = std::mem::take(&mut *self.ribs.lock());
        for rib in ribs.by_name.values() {
            rib.dispose();
        }
    }
}

impl std::fmt::Debug for Vrf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vrf")
            .field("name", &self.name)
            .field("rd", &route_distinguisher_to_string(self.rd))
            .field("ribs", &self.rib_names())
            .finish()
    }
}

//------------ VrfRegistry ---------------------------------------------------

/// All VRFs of an application, by name.
#[derive(Debug, Default)]
pub struct VrfRegistry {
    vrfs: RwLock<HashMap<String, Arc<Vrf>>>,
}

impl VrfRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The VRF called `name`. It is created, with the default RIBs, if it
    /// doesn't exist. An existing VRF keeps its route distinguisher.
    pub fn create_vrf_if_not_exists(&self, name: &str, rd: u64) -> Arc<Vrf> {
        self.vrfs
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Vrf::new(name, rd)))
            .clone()
    }

    /// Add `vrf` to the registry. Fails if there is a VRF with the same
    /// name already.
    pub fn register_vrf(&self, vrf: Arc<Vrf>) -> Result<(), RibError> {
        let mut vrfs = self.vrfs.write();
        if vrfs.contains_key(vrf.name()) {
            return Err(RibError::VrfExists(vrf.name().to_string()));
        }
        vrfs.insert(vrf.name().to_string(), vrf);
        Ok(())
    }

    /// Remove the VRF called `name` from the registry, returning it. The
    /// VRF is not disposed.
    pub fn unregister_vrf(&self, name: &str) -> Option<Arc<Vrf>> {
        self.vrfs.write().remove(name)
    }

    pub fn get_vrf(&self, name: &str) -> Option<Arc<Vrf>> {
        self.vrfs.read().get(name).cloned()
    }

    /// All registered VRFs, sorted by name.
    pub fn list(&self) -> Vec<Arc<Vrf>> {
        let mut vrfs: Vec<Arc<Vrf>> =
            self.vrfs.read().values().cloned().collect();
        vrfs.sort_by(|a, b| a.name().cmp(b.name()));
        vrfs
    }

    /// Dispose all VRFs and empty the registry.
    pub fn dispose_all(&self) {
        let vrfs = std::mem::take(&mut *self.vrfs.write());
        for vrf in vrfs.values() {
            vrf.dispose();
        }
    }
}
