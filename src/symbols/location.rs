//! Storage-location table
//!
//! A location is a `(depth, offset, size)` triple. Frame-relative locations
//! are deduplicated: the second request for the same triple returns the
//! first location, which is how sibling blocks at one depth end up sharing
//! stack slots. Global and function entries always get a fresh location.

use rustc_hash::FxHashMap;
use std::fmt;

/// Handle of a location in the [`LocationTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(u32);

impl LocationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub depth: usize,
    pub offset: i64,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct LocationTable {
    entries: Vec<Location>,
    shared: FxHashMap<Location, LocationId>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always allocate a new location
    pub fn fresh(&mut self, depth: usize, offset: i64, size: usize) -> LocationId {
        let id = LocationId(self.entries.len() as u32);
        self.entries.push(Location {
            depth,
            offset,
            size,
        });
        id
    }

    /// Location for a frame slot, reusing an existing one with the same triple
    pub fn shared(&mut self, depth: usize, offset: i64, size: usize) -> LocationId {
        let key = Location {
            depth,
            offset,
            size,
        };
        if let Some(&id) = self.shared.get(&key) {
            log::debug!("sharing location {:?} for {:?}", id, key);
            return id;
        }
        let id = self.fresh(depth, offset, size);
        self.shared.insert(key, id);
        id
    }

    pub fn get(&self, id: LocationId) -> Location {
        self.entries[id.index()]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocationId, Location)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, &loc)| (LocationId(i as u32), loc))
    }
}

impl fmt::Display for LocationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LOC:cnt={}", self.len())?;
        for (id, loc) in self.iter() {
            writeln!(
                f,
                "{:4}: depth={:<3} offset={:<4} size={}",
                id.index(),
                loc.depth,
                loc.offset,
                loc.size
            )?;
        }
        Ok(())
    }
}
