/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Scheduling tables and build direction.
//!
//! One [`SchedulingTable`] holds every level: cell `(level, slot, core)` is
//! either idle or the [`ActorKey`] running there.
//!
//! LO tables are built forward from slot `0`; HI tables are built backward
//! from the last slot.  [`Direction`] hides the index arithmetic so the table
//! builder only ever counts *steps* (slots processed so far).

use std::fmt;
use std::ops::Range;

use crate::model::{ActorKey, Level, McSystem, Slot, LO};

use super::error::SchedulerError;

// ── Direction ─────────────────────────────────────────────────────────────────

/// Order in which a level's slots are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Slot `0` up to `hyperperiod - 1` (LO).
    Forward,
    /// Slot `hyperperiod - 1` down to `0` (HI levels).
    Backward,
}

impl Direction {
    /// The direction used to build `level`.
    pub fn for_level(level: Level) -> Self {
        if level == LO {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// Absolute slot filled at `step` (`0 ≤ step < hyperperiod`).
    pub fn slot_at(self, step: Slot, hyperperiod: Slot) -> Slot {
        match self {
            Direction::Forward => step,
            Direction::Backward => hyperperiod - 1 - step,
        }
    }

    /// Order in which cores are handed out within one slot.
    ///
    /// Forward builds fill cores from `0` upward, backward builds from the
    /// highest core downward.
    pub fn core_order(self, cores: usize) -> Vec<usize> {
        match self {
            Direction::Forward => (0..cores).collect(),
            Direction::Backward => (0..cores).rev().collect(),
        }
    }
}

/// The instance window `[k·period, (k+1)·period)` that contains `slot`.
pub fn instance_window(slot: Slot, period: Slot) -> Range<Slot> {
    let start = slot / period * period;
    start..start + period
}

// ── SchedulingTable ───────────────────────────────────────────────────────────

/// Upper bound on `levels × hyperperiod × cores`.
pub const MAX_TABLE_CELLS: usize = 1 << 27;

/// `levels × hyperperiod × cores` grid of optional actors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingTable {
    levels: usize,
    hyperperiod: Slot,
    cores: usize,
    cells: Vec<Option<ActorKey>>,
}

impl SchedulingTable {
    /// An all-idle table.
    ///
    /// Fails with [`SchedulerError::TableTooLarge`] when the cell count
    /// overflows or exceeds [`MAX_TABLE_CELLS`].
    pub fn new(levels: usize, hyperperiod: Slot, cores: usize) -> Result<Self, SchedulerError> {
        let too_large = || SchedulerError::TableTooLarge {
            levels,
            hyperperiod,
            cores,
        };
        let len = usize::try_from(hyperperiod)
            .ok()
            .and_then(|h| h.checked_mul(levels))
            .and_then(|n| n.checked_mul(cores))
            .filter(|&n| n <= MAX_TABLE_CELLS)
            .ok_or_else(too_large)?;

        Ok(Self {
            levels,
            hyperperiod,
            cores,
            cells: vec![None; len],
        })
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn hyperperiod(&self) -> Slot {
        self.hyperperiod
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    fn offset(&self, level: Level, slot: Slot) -> usize {
        debug_assert!(level < self.levels && slot < self.hyperperiod);
        (level * self.hyperperiod as usize + slot as usize) * self.cores
    }

    /// Occupant of `(level, slot, core)`.
    pub fn get(&self, level: Level, slot: Slot, core: usize) -> Option<ActorKey> {
        self.cells[self.offset(level, slot) + core]
    }

    /// All cores of one slot.
    pub fn slot(&self, level: Level, slot: Slot) -> &[Option<ActorKey>] {
        let start = self.offset(level, slot);
        &self.cells[start..start + self.cores]
    }

    pub(crate) fn assign(&mut self, level: Level, slot: Slot, core: usize, key: ActorKey) {
        let at = self.offset(level, slot) + core;
        debug_assert!(self.cells[at].is_none(), "cell assigned twice");
        self.cells[at] = Some(key);
    }

    /// `true` if `key` runs on any core at `(level, slot)`.
    pub fn runs(&self, level: Level, slot: Slot, key: ActorKey) -> bool {
        self.slot(level, slot).contains(&Some(key))
    }

    /// Number of cells given to `key` at `level` over `slots`.
    ///
    /// Slots past the hyperperiod are ignored.
    pub fn count(&self, level: Level, key: ActorKey, slots: Range<Slot>) -> Slot {
        let end = slots.end.min(self.hyperperiod);
        (slots.start..end)
            .filter(|&s| self.runs(level, s, key))
            .count() as Slot
    }

    /// Render with actor names from `system`.
    pub fn display<'a>(&'a self, system: &'a McSystem) -> TableDisplay<'a> {
        TableDisplay {
            table: self,
            system,
        }
    }
}

/// [`fmt::Display`] adapter returned by [`SchedulingTable::display`]:
/// one row per core, highest level first, `-` for idle cells.
pub struct TableDisplay<'a> {
    table: &'a SchedulingTable,
    system: &'a McSystem,
}

impl fmt::Display for TableDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.table;
        let width = self
            .system
            .keys()
            .map(|k| self.system.name(k).len())
            .max()
            .unwrap_or(1);

        for level in (0..t.levels).rev() {
            writeln!(f, "level {level}:")?;
            for core in 0..t.cores {
                write!(f, "  core {core:>2} |")?;
                for slot in 0..t.hyperperiod {
                    let name = t
                        .get(level, slot, core)
                        .map(|k| self.system.name(k))
                        .unwrap_or("-");
                    write!(f, " {name:<width$} |")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
