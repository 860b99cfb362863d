use std::collections::HashMap;

use inetnum::asn::Asn;
use log::trace;
use parking_lot::Mutex;

use crate::errors::{FatalError, FatalResult};

//------------ ContributingAsns ----------------------------------------------

/// The ASNs of the sessions that feed a local RIB, with a reference count
/// per ASN. Used to recognize routing loops in AS paths.
#[derive(Debug, Default)]
pub struct ContributingAsns {
    asns: Mutex<HashMap<Asn, u32>>,
}

impl ContributingAsns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reference to `asn`. A reference count that would overflow is
    /// a fatal error, the count is left unchanged.
    pub fn add(&self, asn: Asn) -> FatalResult<()> {
        let mut asns = self.asns.lock();
        let count = asns.entry(asn).or_insert(0);
        *count = count.checked_add(1).ok_or(FatalError)?;
        trace!("contributing asn {} count {}", asn, count);
        Ok(())
    }

    /// Drop a reference to `asn`. The ASN is forgotten when its last
    /// reference is dropped. Returns false if the ASN was not listed.
    pub fn remove(&self, asn: Asn) -> bool {
        let mut asns = self.asns.lock();
        match asns.get_mut(&asn) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                asns.remove(&asn);
                true
            }
            None => false,
        }
    }

    pub fn is_contributing(&self, asn: Asn) -> bool {
        self.asns.lock().contains_key(&asn)
    }

    pub fn len(&self) -> usize {
        self.asns.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.asns.lock().is_empty()
    }

    #[cfg(test)]
    pub(crate) fn set_count(&self, asn: Asn, count: u32) {
        self.asns.lock().insert(asn, count);
    }
}
