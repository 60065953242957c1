//! Fixed-capacity slot table with mode-selected lock instances.
//!
//! The table is a pure data holder: `hash` is `key % capacity` and collision
//! resolution lives entirely in the worker probe protocol. Capacity is fixed
//! for the table's lifetime; there is no resize or rehash path.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sim::lock::SlotLock;

/// Locking granularity configured once at table construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockMode {
    /// One exclusive lock over the whole table.
    #[serde(rename = "global")]
    Global,
    /// One exclusive lock per slot.
    #[serde(rename = "per_slot")]
    PerSlotExclusive,
    /// One reader/writer lock per slot.
    #[serde(rename = "shared_per_slot")]
    PerSlotShared,
}

impl LockMode {
    /// All modes, in the order the CLI sweeps them.
    pub const ALL: [LockMode; 3] = [
        LockMode::Global,
        LockMode::PerSlotExclusive,
        LockMode::PerSlotShared,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::PerSlotExclusive => "per_slot",
            Self::PerSlotShared => "shared_per_slot",
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockMode {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "per_slot" => Ok(Self::PerSlotExclusive),
            "shared_per_slot" => Ok(Self::PerSlotShared),
            other => Err(SetupError::UnknownMode {
                given: other.to_string(),
            }),
        }
    }
}

/// Configuration error rejected before any tick runs.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SetupError {
    /// A table cannot be built with zero slots.
    ZeroCapacity,
    /// The lock mode string did not name a known granularity.
    UnknownMode { given: String },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => f.write_str("table capacity must be > 0"),
            Self::UnknownMode { given } => write!(
                f,
                "unknown lock mode {given:?} (expected global, per_slot, or shared_per_slot)"
            ),
        }
    }
}

impl std::error::Error for SetupError {}

/// Lock storage matching the table's mode: one instance or one per slot.
#[derive(Clone, Debug)]
enum TableLocks {
    Global(SlotLock),
    PerSlot(Vec<SlotLock>),
}

/// Fixed-capacity slot array plus its governing lock instances.
#[derive(Clone, Debug)]
pub struct SlotTable {
    mode: LockMode,
    slots: Box<[Option<u64>]>,
    locks: TableLocks,
}

impl SlotTable {
    /// Build a table with `capacity` slots under the given lock granularity.
    pub fn new(capacity: u32, mode: LockMode) -> Result<Self, SetupError> {
        if capacity == 0 {
            return Err(SetupError::ZeroCapacity);
        }
        let n = capacity as usize;
        let locks = match mode {
            LockMode::Global => TableLocks::Global(SlotLock::exclusive()),
            LockMode::PerSlotExclusive => {
                TableLocks::PerSlot(vec![SlotLock::exclusive(); n])
            }
            LockMode::PerSlotShared => TableLocks::PerSlot(vec![SlotLock::shared(); n]),
        };
        Ok(Self {
            mode,
            slots: vec![None; n].into_boxed_slice(),
            locks,
        })
    }

    #[inline(always)]
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    #[inline(always)]
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Home slot for a key.
    #[inline(always)]
    pub fn hash(&self, key: u64) -> u32 {
        (key % self.slots.len() as u64) as u32
    }

    /// Key currently stored at `index`, if any.
    #[inline(always)]
    pub fn slot(&self, index: u32) -> Option<u64> {
        self.slots[index as usize]
    }

    /// Store `key` at `index`. The caller must hold the governing lock in
    /// write mode; the simulator's worker protocol guarantees this.
    pub(crate) fn write_slot(&mut self, index: u32, key: u64) {
        debug_assert!(self.slots[index as usize].is_none());
        self.slots[index as usize] = Some(key);
    }

    /// The lock instance governing `index` under the configured mode.
    pub fn lock_for(&mut self, index: u32) -> &mut SlotLock {
        match &mut self.locks {
            TableLocks::Global(lock) => lock,
            TableLocks::PerSlot(locks) => &mut locks[index as usize],
        }
    }

    /// Occupied slots in index order, for end-of-run summaries.
    pub fn occupied(&self) -> Vec<(u32, u64)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|key| (i as u32, key)))
            .collect()
    }

    pub fn occupied_count(&self) -> u32 {
        self.slots.iter().filter(|s| s.is_some()).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::lock::AccessMode;

    #[test]
    fn hash_is_key_mod_capacity() {
        let table = SlotTable::new(10, LockMode::Global).unwrap();
        assert_eq!(table.hash(25), 5);
        assert_eq!(table.hash(35), 5);
        assert_eq!(table.hash(7), 7);
    }

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(
            SlotTable::new(0, LockMode::Global).unwrap_err(),
            SetupError::ZeroCapacity
        );
    }

    #[test]
    fn mode_strings_round_trip() {
        for mode in LockMode::ALL {
            assert_eq!(mode.as_str().parse::<LockMode>().unwrap(), mode);
        }
        assert!(matches!(
            "spinlock".parse::<LockMode>(),
            Err(SetupError::UnknownMode { .. })
        ));
    }

    #[test]
    fn global_mode_shares_one_lock_across_slots() {
        let mut table = SlotTable::new(4, LockMode::Global).unwrap();
        assert!(table.lock_for(0).try_acquire(AccessMode::Write, 1).is_acquired());
        // Any other slot resolves to the same held lock.
        assert!(!table.lock_for(3).try_acquire(AccessMode::Write, 1).is_acquired());
    }

    #[test]
    fn per_slot_mode_locks_independently() {
        let mut table = SlotTable::new(4, LockMode::PerSlotExclusive).unwrap();
        assert!(table.lock_for(0).try_acquire(AccessMode::Write, 1).is_acquired());
        assert!(table.lock_for(1).try_acquire(AccessMode::Write, 1).is_acquired());
    }
}
