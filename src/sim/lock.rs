//! Steppable lock models keyed by discrete simulation ticks.
//!
//! Both primitives are small state machines driven by an explicit tick value
//! instead of wall time. A strict `tick > last_release_tick` guard enforces a
//! one-tick refractory period: a lock released at tick T cannot be reacquired
//! before T+1. Under round-robin stepping this is what makes contention and
//! fairness effects observable at all.
//!
//! Invariants:
//! - `SimMutex` has at most one holder at any tick.
//! - `SimRwLock` never holds a writer while `readers > 0`.
//! - Contention is an ordinary status value; only a release with no
//!   outstanding holder is an error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access requested against a lock, derived from the operation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Read,
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Outcome of a single non-blocking acquire attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquireOutcome {
    /// The caller now holds the lock in the requested mode.
    Acquired,
    /// Another holder currently occupies the lock; retry on a later tick.
    Contended,
}

impl AcquireOutcome {
    #[inline(always)]
    pub fn is_acquired(self) -> bool {
        matches!(self, Self::Acquired)
    }
}

/// Internal-consistency error: releasing a lock with no outstanding holder.
///
/// This signals a defect in the calling state machine, never an ordinary
/// runtime condition, and is reported distinctly from contention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum LockViolation {
    /// `release` on an exclusive lock that is not held.
    NotHeld,
    /// `release_read` with a zero reader count.
    NoReaders,
    /// `release_write` with no writer holding the lock.
    NoWriter,
}

impl fmt::Display for LockViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotHeld => f.write_str("release of an exclusive lock that is not held"),
            Self::NoReaders => f.write_str("read release with no outstanding readers"),
            Self::NoWriter => f.write_str("write release with no writer holding the lock"),
        }
    }
}

impl std::error::Error for LockViolation {}

/// Exclusive lock with a one-tick refractory period after release.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimMutex {
    held: bool,
    /// Tick of the most recent release; `None` until the first release.
    last_release_tick: Option<u64>,
}

impl SimMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to take the lock at `tick`.
    ///
    /// Succeeds iff the lock is free and `tick` is strictly past the last
    /// release. A release and reacquire can never share a tick.
    pub fn try_acquire(&mut self, tick: u64) -> AcquireOutcome {
        if self.held || !past_refractory(self.last_release_tick, tick) {
            return AcquireOutcome::Contended;
        }
        self.held = true;
        AcquireOutcome::Acquired
    }

    /// Release the lock at `tick`, recording the refractory boundary.
    pub fn release(&mut self, tick: u64) -> Result<(), LockViolation> {
        if !self.held {
            return Err(LockViolation::NotHeld);
        }
        self.held = false;
        self.last_release_tick = Some(tick);
        Ok(())
    }

    #[inline(always)]
    pub fn is_held(&self) -> bool {
        self.held
    }
}

/// Reader/writer lock with the same tick-refractory semantics.
///
/// The refractory boundary is recorded when the lock becomes fully free:
/// on writer release, or when the reader count returns to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimRwLock {
    readers: u32,
    writer: bool,
    last_release_tick: Option<u64>,
}

impl SimRwLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt shared access at `tick`. Readers stack freely while no writer
    /// holds the lock.
    pub fn try_acquire_read(&mut self, tick: u64) -> AcquireOutcome {
        if self.writer || !past_refractory(self.last_release_tick, tick) {
            return AcquireOutcome::Contended;
        }
        self.readers += 1;
        AcquireOutcome::Acquired
    }

    /// Attempt exclusive access at `tick`. Blocked by any reader or writer.
    pub fn try_acquire_write(&mut self, tick: u64) -> AcquireOutcome {
        if self.readers > 0 || self.writer || !past_refractory(self.last_release_tick, tick) {
            return AcquireOutcome::Contended;
        }
        self.writer = true;
        AcquireOutcome::Acquired
    }

    /// Drop one shared hold. The refractory boundary moves only when the
    /// count returns to zero.
    pub fn release_read(&mut self, tick: u64) -> Result<(), LockViolation> {
        if self.readers == 0 {
            return Err(LockViolation::NoReaders);
        }
        self.readers -= 1;
        if self.readers == 0 {
            self.last_release_tick = Some(tick);
        }
        Ok(())
    }

    /// Drop the exclusive hold.
    pub fn release_write(&mut self, tick: u64) -> Result<(), LockViolation> {
        if !self.writer {
            return Err(LockViolation::NoWriter);
        }
        self.writer = false;
        self.last_release_tick = Some(tick);
        Ok(())
    }

    #[inline(always)]
    pub fn reader_count(&self) -> u32 {
        self.readers
    }

    #[inline(always)]
    pub fn writer_held(&self) -> bool {
        self.writer
    }
}

/// Tagged lock variant with a uniform attempt/release contract.
///
/// Callers dispatch on the table's lock mode, never on lock type identity.
/// An exclusive lock treats both access modes identically, so a reader over
/// a non-shared table simply takes the lock exclusively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotLock {
    Exclusive(SimMutex),
    Shared(SimRwLock),
}

impl SlotLock {
    pub fn exclusive() -> Self {
        Self::Exclusive(SimMutex::new())
    }

    pub fn shared() -> Self {
        Self::Shared(SimRwLock::new())
    }

    /// Attempt the lock in `mode` at `tick`.
    pub fn try_acquire(&mut self, mode: AccessMode, tick: u64) -> AcquireOutcome {
        match self {
            Self::Exclusive(m) => m.try_acquire(tick),
            Self::Shared(rw) => match mode {
                AccessMode::Read => rw.try_acquire_read(tick),
                AccessMode::Write => rw.try_acquire_write(tick),
            },
        }
    }

    /// Release the hold taken in `mode` at `tick`.
    ///
    /// The mode must match the acquire; for shared locks a mismatched release
    /// is exactly the kind of state machine defect [`LockViolation`] exists
    /// to surface.
    pub fn release(&mut self, mode: AccessMode, tick: u64) -> Result<(), LockViolation> {
        match self {
            Self::Exclusive(m) => m.release(tick),
            Self::Shared(rw) => match mode {
                AccessMode::Read => rw.release_read(tick),
                AccessMode::Write => rw.release_write(tick),
            },
        }
    }
}

#[inline(always)]
fn past_refractory(last_release_tick: Option<u64>, tick: u64) -> bool {
    match last_release_tick {
        Some(last) => tick > last,
        None => true,
    }
}
