//! Decoded image pixels and pending asynchronous loads.
//!
//! Snapshots only carry a source reference; the pixels live here, keyed by
//! that reference, for the lifetime of the session. A key never changes its
//! pixels once a node refers to it.

use std::collections::HashMap;
use std::sync::Arc;
use tc_core::Raster;

/// Handle for an image decode started by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(pub u64);

/// What to do with an image once its decode completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadTarget {
    /// Insert as a new image node.
    Insert,
    /// Dropped at a stage position: fill the placeholder under it, if any.
    DropAt { x: f32, y: f32 },
}

#[derive(Debug, Default)]
pub struct AssetStore {
    rasters: HashMap<String, Arc<Raster>>,
    pending: HashMap<LoadTicket, LoadTarget>,
    next_ticket: u64,
}

impl AssetStore {
    pub fn insert(&mut self, source: impl Into<String>, raster: Raster) -> Arc<Raster> {
        let raster = Arc::new(raster);
        self.rasters.insert(source.into(), Arc::clone(&raster));
        raster
    }

    /// Store uploaded pixels and return the key nodes should refer to.
    /// `source` is reused when it is free or already holds the same pixels;
    /// otherwise the first free `source#n` is minted.
    pub fn store(&mut self, source: &str, raster: Raster) -> String {
        let mut key = source.to_string();
        let mut n = 1;
        while let Some(existing) = self.rasters.get(&key) {
            if **existing == raster {
                return key;
            }
            key = format!("{source}#{n}");
            n += 1;
        }
        log::debug!("stored image '{key}' ({}x{})", raster.width(), raster.height());
        self.insert(key.clone(), raster);
        key
    }

    pub fn get(&self, source: &str) -> Option<&Arc<Raster>> {
        self.rasters.get(source)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.rasters.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }

    /// Register a load that the host will complete later.
    pub fn begin_load(&mut self, target: LoadTarget) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.insert(ticket, target);
        log::debug!("image load {} started ({target:?})", ticket.0);
        ticket
    }

    /// Claim a pending load. Each ticket completes at most once.
    pub fn finish_load(&mut self, ticket: LoadTicket) -> Option<LoadTarget> {
        self.pending.remove(&ticket)
    }

    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }
}
