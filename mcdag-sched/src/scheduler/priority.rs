/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Priority engine: ranks the ready list at every slot.
//!
//! Every ready actor gets an integer [`Weight`]; **lower is more urgent**.
//!
//! * [`URGENT`] (`0`) – zero laxity, or a LO actor promoted so that a future
//!   switch to the next level stays feasible.
//! * [`MUST_WAIT`] (`Weight::MAX`) – a HI actor that must not run in this
//!   slot because the next level up has not reserved its extra budget yet.
//! * negative – the actor cannot meet its deadline any more.
//!
//! Two policies share the promotion and delay rules and differ only in how
//! they weigh HI actors:
//!
//! | Policy | LO | HI |
//! |---|---|---|
//! | [`LeastLaxityFirst`] | laxity | laxity |
//! | [`Hybrid`] | laxity | local deadline (EDF) |

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::deadline::LocalDeadlines;
use super::ready::ReadinessTracker;
use super::table::{instance_window, Direction, SchedulingTable};
use super::SchedulerError;
use crate::model::{ActorKey, Level, McSystem, Slot, LO};

/// Priority weight.  Lower runs first.
pub type Weight = i64;

/// Weight of an actor that has to run in this slot.
pub const URGENT: Weight = 0;

/// Weight of an actor that must not run in this slot.
pub const MUST_WAIT: Weight = Weight::MAX;

// ── SlotView ──────────────────────────────────────────────────────────────────

/// Read-only snapshot of one build step, handed to a [`PriorityPolicy`].
pub struct SlotView<'a> {
    pub system: &'a McSystem,
    pub deadlines: &'a LocalDeadlines,
    pub table: &'a SchedulingTable,
    pub tracker: &'a ReadinessTracker,
    pub level: Level,
    /// Slots already processed at this level.
    pub step: Slot,
}

impl SlotView<'_> {
    /// Absolute slot about to be filled.
    pub fn slot(&self) -> Slot {
        Direction::for_level(self.level).slot_at(self.step, self.table.hyperperiod())
    }

    /// Slots of the current instance of `key`'s graph already processed,
    /// counted along the build direction.
    pub fn elapsed(&self, key: ActorKey) -> Slot {
        self.step % self.system.actor(key).graph_period
    }

    pub fn deadline(&self, key: ActorKey) -> Weight {
        self.deadlines.get(self.level, key).unwrap_or(Weight::MAX)
    }

    /// `deadline − elapsed − remaining`.
    pub fn laxity(&self, key: ActorKey) -> Weight {
        self.deadline(key)
            .saturating_sub(self.elapsed(key) as Weight)
            .saturating_sub(self.tracker.remaining(key) as Weight)
    }

    /// Execution already granted to `key` at this level in its current
    /// instance.
    fn executed(&self, key: ActorKey) -> Slot {
        self.system.actor(key).wcet(self.level) - self.tracker.remaining(key)
    }

    /// LO only: `true` when level 1 has already executed `key` for more
    /// slots, up to and including this one, than LO has so far.
    ///
    /// Running `key` now keeps LO at least as far along as level 1, so a
    /// mode switch at any point finds enough budget left in the level-1
    /// table.
    pub fn needs_promotion(&self, key: ActorKey) -> bool {
        if self.level != LO || self.system.levels() < 2 {
            return false;
        }
        let actor = self.system.actor(key);
        if !actor.is_active(LO + 1) {
            return false;
        }
        let slot = self.slot();
        let window = instance_window(slot, actor.graph_period);
        let above = self.table.count(LO + 1, key, window.start..slot + 1);
        self.executed(key) < above
    }

    /// HI levels below the top only: `true` when running `key` now would put
    /// this level ahead of what level `L+1` has reserved between this slot
    /// and the end of the instance, extra budget `WCET[L+1] − WCET[L]`
    /// included.
    pub fn must_delay(&self, key: ActorKey) -> bool {
        let level = self.level;
        if level == LO || level + 1 >= self.system.levels() {
            return false;
        }
        let actor = self.system.actor(key);
        if !actor.is_active(level + 1) {
            return false;
        }
        let slot = self.slot();
        let window = instance_window(slot, actor.graph_period);
        let reserved = self.table.count(level + 1, key, slot..window.end) as Weight;
        let delta = actor.wcet(level + 1) as Weight - actor.wcet(level) as Weight;
        self.executed(key) as Weight + 1 + delta > reserved
    }
}

// ── PriorityPolicy ────────────────────────────────────────────────────────────

/// Strategy that ranks a ready list.
///
/// Implementors only decide the HI weight; promotion, forced delay and the
/// deterministic ordering are shared.
pub trait PriorityPolicy: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Weight of a HI actor that is not forced to wait.
    fn hi_weight(&self, view: &SlotView<'_>, key: ActorKey) -> Weight;

    /// Weight of a LO actor.
    fn lo_weight(&self, view: &SlotView<'_>, key: ActorKey) -> Weight {
        if view.needs_promotion(key) {
            debug!(slot = view.slot(), actor = %view.system.name(key), "promotion");
            URGENT
        } else {
            view.laxity(key)
        }
    }

    /// `true` if `key` must not run in this slot.
    fn is_delayed(&self, view: &SlotView<'_>, key: ActorKey) -> bool {
        view.must_delay(key)
    }

    fn weight(&self, view: &SlotView<'_>, key: ActorKey) -> Weight {
        if view.level == LO {
            self.lo_weight(view, key)
        } else if self.is_delayed(view, key) {
            debug!(
                level = view.level,
                slot = view.slot(),
                actor = %view.system.name(key),
                "delayed"
            );
            MUST_WAIT
        } else {
            self.hi_weight(view, key)
        }
    }

    /// Weigh every actor of `ready` and order them, most urgent first.
    ///
    /// Equal weights break by ascending [`ActorKey`] on LO and descending on
    /// HI levels.
    fn rank(&self, view: &SlotView<'_>, ready: &[ActorKey]) -> Vec<(ActorKey, Weight)> {
        let mut ranked: Vec<(ActorKey, Weight)> =
            ready.iter().map(|&k| (k, self.weight(view, k))).collect();
        let direction = Direction::for_level(view.level);
        ranked.sort_by(|a, b| rank_order(direction, a, b));
        ranked
    }
}

/// Least-laxity-first at every level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastLaxityFirst;

impl PriorityPolicy for LeastLaxityFirst {
    fn name(&self) -> &'static str {
        "least_laxity"
    }

    fn hi_weight(&self, view: &SlotView<'_>, key: ActorKey) -> Weight {
        view.laxity(key)
    }
}

/// EDF on HI levels, least-laxity-first on LO.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hybrid;

impl PriorityPolicy for Hybrid {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn hi_weight(&self, view: &SlotView<'_>, key: ActorKey) -> Weight {
        view.deadline(key)
    }
}

// ── Algorithm ─────────────────────────────────────────────────────────────────

/// Scheduler variant selectable from configuration or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// [`LeastLaxityFirst`].
    #[default]
    LeastLaxity,
    /// [`Hybrid`].
    Hybrid,
}

impl Algorithm {
    pub fn policy(self) -> Box<dyn PriorityPolicy> {
        match self {
            Algorithm::LeastLaxity => Box::new(LeastLaxityFirst),
            Algorithm::Hybrid => Box::new(Hybrid),
        }
    }
}

impl FromStr for Algorithm {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "least_laxity" => Ok(Algorithm::LeastLaxity),
            "hybrid" => Ok(Algorithm::Hybrid),
            other => Err(SchedulerError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::LeastLaxity => "least_laxity",
            Algorithm::Hybrid => "hybrid",
        })
    }
}

/// Order of two ranked entries: weight first, then key in build direction.
pub fn rank_order(
    direction: Direction,
    a: &(ActorKey, Weight),
    b: &(ActorKey, Weight),
) -> Ordering {
    a.1.cmp(&b.1).then_with(|| match direction {
        Direction::Forward => a.0.cmp(&b.0),
        Direction::Backward => b.0.cmp(&a.0),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
