//! # Packed trigger state word.
//!
//! All coordination between `fire`, `suspend` and running dispatches goes
//! through one `AtomicU64`, mutated only by compare-and-swap.
//!
//! ## Layout
//! ```text
//!  63                              32 31 30                              0
//! ┌──────────────────────────────────┬──┬─────────────────────────────────┐
//! │ reservation (copy of bits 0..32) │R │ version (mod 2^31)              │
//! └──────────────────────────────────┴──┴─────────────────────────────────┘
//! ```
//!
//! - **version**: generation counter; bumped by every fire and by suspend.
//! - **R**: running flag; set while one dispatch owns the work.
//! - **reservation**: when a fire lands during a run, the low 32 bits are
//!   copied here. A reservation equal to the live low bits is a rerun ticket.
//!
//! ## Transitions
//! ```text
//! Idle ──acquire──► Running ──coalesce──► RunningReserved ──coalesce──┐
//!  ▲                   │  ▲                     │       ▲             │
//!  └────release────────┘  └────claim rerun──────┘       └─────────────┘
//! ```
//! `advance_version` may run in any phase; it clears the reservation and keeps R.

use std::sync::atomic::{AtomicU64, Ordering};

const VERSION_MASK: u64 = 0x0000_0000_7FFF_FFFF;
const RUNNING_FLAG: u64 = 0x0000_0000_8000_0000;
const LOW_MASK: u64 = VERSION_MASK | RUNNING_FLAG;
const RESERVATION_SHIFT: u32 = 32;

/// Coarse phase of a trigger, derived from a state snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No dispatch owns the work.
    Idle,
    /// A dispatch is running the work; no rerun is owed.
    Running,
    /// A dispatch is running the work and one extra run is owed.
    RunningReserved,
}

/// Point-in-time view of a trigger's state word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current generation counter.
    pub version: u32,
    /// Current phase.
    pub phase: Phase,
}

/// Decoded value of the state word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct State(u64);

impl State {
    #[inline(always)]
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub(crate) const fn raw(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub(crate) const fn version(self) -> u32 {
        (self.0 & VERSION_MASK) as u32
    }

    #[inline(always)]
    pub(crate) const fn is_running(self) -> bool {
        self.0 & RUNNING_FLAG != 0
    }

    /// Version and running flag, without the reservation.
    #[inline(always)]
    const fn low(self) -> u64 {
        self.0 & LOW_MASK
    }

    #[inline(always)]
    const fn reservation(self) -> u64 {
        self.0 >> RESERVATION_SHIFT
    }

    /// True when a rerun ticket matching the live low bits is held.
    #[inline(always)]
    pub(crate) const fn has_ticket(self) -> bool {
        self.reservation() == self.low()
    }

    /// Next version, running flag kept, reservation dropped.
    #[inline(always)]
    pub(crate) const fn advanced(self) -> Self {
        let next = ((self.0 & VERSION_MASK) + 1) & VERSION_MASK;
        Self((self.0 & RUNNING_FLAG) | next)
    }

    #[inline(always)]
    pub(crate) const fn acquired(self) -> Self {
        Self(self.0 | RUNNING_FLAG)
    }

    /// Low bits copied into the reservation field.
    #[inline(always)]
    pub(crate) const fn reserved(self) -> Self {
        Self(self.low() | (self.0 << RESERVATION_SHIFT))
    }

    /// Reservation cleared, still running.
    #[inline(always)]
    pub(crate) const fn ticket_claimed(self) -> Self {
        Self(self.low())
    }

    /// Only the version survives.
    #[inline(always)]
    pub(crate) const fn released(self) -> Self {
        Self(self.0 & VERSION_MASK)
    }

    pub(crate) const fn phase(self) -> Phase {
        if !self.is_running() {
            Phase::Idle
        } else if self.has_ticket() {
            Phase::RunningReserved
        } else {
            Phase::Running
        }
    }
}

/// Outcome of a dispatch trying to take ownership of the work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Acquire {
    /// The captured version was superseded; nothing happened.
    Stale,
    /// The dispatch now owns the work.
    Acquired,
    /// Another dispatch is running; a rerun ticket was left for it.
    Coalesced,
}

/// Outcome of the running dispatch trying to give the work back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Release {
    /// A ticket was claimed: run again under `version`, still owning the work.
    Rerun { version: u32 },
    /// Ownership dropped. `current` is true when no fire or suspend moved the
    /// version away from the one the dispatch ran under.
    Released { current: bool },
}

/// The atomic register behind a trigger.
#[derive(Debug, Default)]
pub(crate) struct StateWord {
    word: AtomicU64,
}

impl StateWord {
    pub(crate) fn new() -> Self {
        Self {
            word: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn load(&self) -> State {
        State::from_raw(self.word.load(Ordering::Acquire))
    }

    #[inline]
    fn swap(&self, current: State, new: State) -> bool {
        self.word
            .compare_exchange_weak(
                current.raw(),
                new.raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Bumps the version (mod 2^31), clears the reservation, keeps the running
    /// flag. Returns the installed version.
    pub(crate) fn advance_version(&self) -> u32 {
        loop {
            let s = self.load();
            let next = s.advanced();
            if self.swap(s, next) {
                return next.version();
            }
        }
    }

    /// Acquire-or-coalesce for a dispatch created under `version`.
    pub(crate) fn try_acquire(&self, version: u32) -> Acquire {
        loop {
            let s = self.load();
            if s.version() != version {
                return Acquire::Stale;
            }
            if !s.is_running() {
                if self.swap(s, s.acquired()) {
                    return Acquire::Acquired;
                }
            } else if self.swap(s, s.reserved()) {
                return Acquire::Coalesced;
            }
        }
    }

    /// Release-or-continue for the owner that last ran under `version`.
    pub(crate) fn release(&self, version: u32) -> Release {
        loop {
            let s = self.load();
            if s.has_ticket() {
                if self.swap(s, s.ticket_claimed()) {
                    return Release::Rerun {
                        version: s.version(),
                    };
                }
            } else if self.swap(s, s.released()) {
                return Release::Released {
                    current: s.version() == version,
                };
            }
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        let s = self.load();
        Snapshot {
            version: s.version(),
            phase: s.phase(),
        }
    }
}
