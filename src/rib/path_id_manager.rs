use std::collections::HashMap;

use log::trace;

use crate::errors::RibError;
use crate::route::BgpPath;

//------------ PathIdManager -------------------------------------------------

/// Hands out the ADD-PATH path identifiers of an outgoing RIB.
///
/// Paths with the same attributes share an identifier, whatever prefix
/// they are sent for. The identifier is reference counted and becomes
/// free again once the last path using it is released. Identifier zero is
/// never handed out.
pub(crate) struct PathIdManager {
    ids: HashMap<u32, u64>,
    id_by_path: HashMap<BgpPath, u32>,
    last: u32,
    max_ids: usize,
}

impl Default for PathIdManager {
    fn default() -> Self {
        Self::with_max_ids(u32::MAX as usize)
    }
}

impl PathIdManager {
    pub fn with_max_ids(max_ids: usize) -> Self {
        Self {
            ids: HashMap::new(),
            id_by_path: HashMap::new(),
            last: 0,
            max_ids,
        }
    }

    // The received identifier is not part of what makes paths share an
    // outgoing identifier.
    fn key(bgp: &BgpPath) -> BgpPath {
        BgpPath {
            path_identifier: 0,
            ..bgp.clone()
        }
    }

    /// The identifier currently assigned to paths with the attributes of
    /// `bgp`, if any.
    pub fn id_of(&self, bgp: &BgpPath) -> Option<u32> {
        self.id_by_path.get(&Self::key(bgp)).copied()
    }

    /// Take a reference on the identifier for `bgp`, assigning a new one if
    /// no path with these attributes has one.
    pub fn add_path(&mut self, bgp: &BgpPath) -> Result<u32, RibError> {
        let key = Self::key(bgp);
        if let Some(id) = self.id_by_path.get(&key).copied() {
            let count = self.ids.entry(id).or_insert(0);
            *count = count.saturating_add(1);
            return Ok(id);
        }

        if self.ids.len() >= self.max_ids {
            return Err(RibError::OutOfPathIds);
        }

        self.last = self.last.wrapping_add(1);
        while self.last == 0 || self.ids.contains_key(&self.last) {
            self.last = self.last.wrapping_add(1);
        }

        trace!("assigned path id {} to {}", self.last, key);
        self.id_by_path.insert(key, self.last);
        self.ids.insert(self.last, 1);
        Ok(self.last)
    }

    /// Drop a reference on the identifier for `bgp` and return it. The
    /// identifier is free for reuse once no path holds it anymore.
    pub fn release_path(&mut self, bgp: &BgpPath) -> Result<u32, RibError> {
        let key = Self::key(bgp);
        let Some(id) = self.id_by_path.get(&key).copied() else {
            return Err(RibError::PathNotFound);
        };

        let remaining = match self.ids.get_mut(&id) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            trace!("path id {} is free", id);
            self.ids.remove(&id);
            self.id_by_path.remove(&key);
        }
        Ok(id)
    }

    pub fn used(&self) -> usize {
        self.ids.len()
    }
}
