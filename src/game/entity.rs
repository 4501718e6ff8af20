//! Entity identity handles.
//!
//! Every simulated object is addressed by an integer slot id plus the
//! generation (`hash`) the slot carried when the handle was captured.
//! Slots are reused after deletion with a bumped generation, so a stale
//! handle held by game rules, AI or sync layers resolves to nothing
//! instead of aliasing whatever entity replaced it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weak handle into the world's slot table.
///
/// Validity is a generation match, not a null check: `world.exists(handle)`
/// is true only while the slot's current hash equals the captured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    id: u32,
    hash: u32,
}

impl EntityId {
    pub(crate) fn new(id: u32, hash: u32) -> Self {
        Self { id, hash }
    }

    /// Slot identity. Unique among live entities, reused after death.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Generation recorded at capture time. Non-zero for any handle that
    /// ever pointed at a live entity.
    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Slot index into the world table.
    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.id as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.id, self.hash)
    }
}
