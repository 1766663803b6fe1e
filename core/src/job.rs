//! Timed job table
//!
//! The node has exactly three kinds of timed work and never more than one
//! pending job of each kind, so the table is a fixed slot per kind instead of
//! a queue. Arming a kind that is already pending is a logic error in the
//! caller and panics.

use hal_abstractions::Instant;

/// What a job does when it comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobKind {
    /// Start a probe conversion
    AcquisitionTrigger,
    /// Read the finished conversion into the record
    AcquisitionHarvest,
    /// Hand the record to the MAC
    TransmitAttempt,
}

impl JobKind {
    const COUNT: usize = 3;

    const fn slot(self) -> usize {
        match self {
            Self::AcquisitionTrigger => 0,
            Self::AcquisitionHarvest => 1,
            Self::TransmitAttempt => 2,
        }
    }

    const fn from_slot(slot: usize) -> Self {
        match slot {
            0 => Self::AcquisitionTrigger,
            1 => Self::AcquisitionHarvest,
            _ => Self::TransmitAttempt,
        }
    }
}

/// A job taken off the table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Job {
    pub kind: JobKind,
    pub due: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    due: Instant,
    /// Arming order, breaks ties between jobs due at the same tick
    seq: u32,
}

/// One optional pending job per [`JobKind`]
#[derive(Debug, Default)]
pub struct JobTable {
    slots: [Option<Slot>; JobKind::COUNT],
    next_seq: u32,
}

impl JobTable {
    pub const fn new() -> Self {
        Self {
            slots: [None; JobKind::COUNT],
            next_seq: 0,
        }
    }

    /// Schedule `kind` to run no earlier than `due`
    ///
    /// # Panics
    ///
    /// If a job of the same kind is still pending.
    pub fn arm(&mut self, kind: JobKind, due: Instant) {
        let slot = &mut self.slots[kind.slot()];
        assert!(slot.is_none(), "job {:?} armed twice", kind);
        *slot = Some(Slot {
            due,
            seq: self.next_seq,
        });
        self.next_seq = self.next_seq.wrapping_add(1);
        debug!("Armed {:?} at {} ms", kind, due.ticks());
    }

    /// Schedule `kind` at `due`, replacing a pending job of the same kind
    ///
    /// The replaced job loses its place among ties: it runs after every job
    /// armed before this call.
    pub fn rearm(&mut self, kind: JobKind, due: Instant) {
        if self.slots[kind.slot()].take().is_some() {
            debug!("Replacing pending {:?}", kind);
        }
        self.arm(kind, due);
    }

    pub fn is_armed(&self, kind: JobKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    /// Due time of the pending job of `kind`
    pub fn due(&self, kind: JobKind) -> Option<Instant> {
        self.slots[kind.slot()].map(|slot| slot.due)
    }

    /// Earliest due time over all pending jobs
    pub fn next_due(&self) -> Option<Instant> {
        self.slots.iter().flatten().map(|slot| slot.due).min()
    }

    /// Remove and return the earliest job due at or before `now`
    ///
    /// Jobs due at the same tick come out in arming order.
    pub fn pop_due(&mut self, now: Instant) -> Option<Job> {
        let (index, slot) = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|slot| (index, slot)))
            .filter(|(_, slot)| slot.due <= now)
            .min_by(|(_, a), (_, b)| a.due.cmp(&b.due).then(a.seq.cmp(&b.seq)))?;
        self.slots[index] = None;
        Some(Job {
            kind: JobKind::from_slot(index),
            due: slot.due,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
