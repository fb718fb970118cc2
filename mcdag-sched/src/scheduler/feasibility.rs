/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Demand/capacity analysis run before each level is built.
//!
//! # Theory
//! Over one hyperperiod `H`, an actor active at level `L` is released
//! `H / period` times and needs `WCET[L]` slots per release.  A level can only
//! be tabled if the total demand fits the `cores × H` slots available:
//!
//! $$D_L = \sum_{a} C_L(a) \cdot \frac{H}{T(a)} \leq m \cdot H$$
//!
//! This is a necessary condition only.  Precedence and deadlines can still
//! make a level infeasible; the slot loop detects that.
//!
//! | Utilisation `D_L / H` | Meaning |
//! |---|---|
//! | `≤ 1.0` | fits one core |
//! | `1.0 < u ≤ m` | needs parallelism, logged at `warn` |
//! | `> m` | rejected with `DemandExceedsCapacity` |

use crate::model::{Level, McSystem, Slot};

// ── Public API ────────────────────────────────────────────────────────────────

/// Demand and capacity of one level over one hyperperiod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelLoad {
    pub level: Level,
    /// Slots of execution requested by every active actor.
    pub demand: Slot,
    /// `cores × hyperperiod`.
    pub capacity: Slot,
    /// Actors active at this level.
    pub active_actors: usize,
}

impl LevelLoad {
    /// Demand expressed in cores (`demand / hyperperiod`).
    pub fn utilization(&self, hyperperiod: Slot) -> f64 {
        if hyperperiod == 0 {
            return 0.0;
        }
        self.demand as f64 / hyperperiod as f64
    }

    pub fn fits(&self) -> bool {
        self.demand <= self.capacity
    }
}

/// Compute the [`LevelLoad`] of `level` for a table of length `hyperperiod`.
pub fn level_load(system: &McSystem, level: Level, hyperperiod: Slot) -> LevelLoad {
    let mut demand: Slot = 0;
    let mut active_actors = 0usize;
    for dag in system.graphs() {
        let releases = hyperperiod / dag.period();
        for actor in dag.actors().iter().filter(|a| a.is_active(level)) {
            demand = demand.saturating_add(actor.wcet(level).saturating_mul(releases));
            active_actors += 1;
        }
    }
    LevelLoad {
        level,
        demand,
        capacity: (system.cores() as Slot).saturating_mul(hyperperiod),
        active_actors,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
