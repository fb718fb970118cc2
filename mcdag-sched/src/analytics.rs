/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Preemption and dispatch counters over a finished [`SchedulingTable`].
//!
//! Every active actor's allocations are scanned per level and per graph
//! instance:
//!
//! * a **context switch** is the start of a contiguous run of slots,
//! * a **preemption** is a gap between two runs of the same instance.
//!
//! Running on different cores in consecutive slots is one run, not a
//! preemption.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{ActorKey, Level, McSystem, Slot};
use crate::scheduler::table::SchedulingTable;

/// Counters of one actor, summed over every level and instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActorCounters {
    pub preemptions: u64,
    pub context_switches: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analytics {
    per_actor: BTreeMap<ActorKey, ActorCounters>,
    // [level]
    per_level: Vec<u64>,
    activations: u64,
}

impl Analytics {
    pub fn collect(system: &McSystem, table: &SchedulingTable) -> Self {
        let h = table.hyperperiod();
        let mut per_actor: BTreeMap<ActorKey, ActorCounters> =
            system.keys().map(|k| (k, ActorCounters::default())).collect();
        let mut per_level = vec![0u64; system.levels()];
        let mut activations = 0u64;

        for (level, level_preemptions) in per_level.iter_mut().enumerate() {
            for key in system.keys() {
                let actor = system.actor(key);
                if !actor.is_active(level) {
                    continue;
                }
                let period = actor.graph_period;
                activations += h / period;

                let counters = per_actor.entry(key).or_default();
                for instance in 0..h / period {
                    let start = instance * period;
                    let runs = count_runs(table, level, key, start..start + period);
                    counters.context_switches += runs;
                    let gaps = runs.saturating_sub(1);
                    counters.preemptions += gaps;
                    *level_preemptions += gaps;
                }
            }
        }

        Self {
            per_actor,
            per_level,
            activations,
        }
    }

    /// Counters of `key`; all zero for an unknown key.
    pub fn counters(&self, key: ActorKey) -> ActorCounters {
        self.per_actor.get(&key).copied().unwrap_or_default()
    }

    /// Every actor's counters, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (ActorKey, ActorCounters)> + '_ {
        self.per_actor.iter().map(|(&k, &c)| (k, c))
    }

    /// Preemptions in the table of `level`.
    pub fn preemptions_at(&self, level: Level) -> u64 {
        self.per_level.get(level).copied().unwrap_or(0)
    }

    pub fn total_preemptions(&self) -> u64 {
        self.per_level.iter().sum()
    }

    pub fn total_context_switches(&self) -> u64 {
        self.per_actor.values().map(|c| c.context_switches).sum()
    }

    /// Job activations across all levels: `Σ levels Σ active actors H / period`.
    pub fn activations(&self) -> u64 {
        self.activations
    }
}

/// Number of maximal runs of consecutive slots in `slots` where `key` runs.
fn count_runs(
    table: &SchedulingTable,
    level: Level,
    key: ActorKey,
    slots: std::ops::Range<Slot>,
) -> u64 {
    let mut runs = 0;
    let mut running = false;
    for slot in slots {
        let now = table.runs(level, slot, key);
        if now && !running {
            runs += 1;
        }
        running = now;
    }
    runs
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DagBuilder;

    fn system() -> McSystem {
        McSystem::builder(2, 2)
            .graph(DagBuilder::new(0, 4).actor("A", [2, 3]).actor("B", [1, 0]))
            .build()
            .unwrap()
    }

    #[test]
    fn gap_inside_instance_is_a_preemption() {
        let system = system();
        let a = system.key_of("A").unwrap();
        let mut table = SchedulingTable::new(2, 4, 2).unwrap();
        table.assign(0, 0, 0, a);
        table.assign(0, 2, 0, a);

        let analytics = Analytics::collect(&system, &table);
        assert_eq!(
            analytics.counters(a),
            ActorCounters {
                preemptions: 1,
                context_switches: 2
            }
        );
        assert_eq!(analytics.preemptions_at(0), 1);
        assert_eq!(analytics.preemptions_at(1), 0);
    }

    #[test]
    fn core_migration_is_not_a_preemption() {
        let system = system();
        let a = system.key_of("A").unwrap();
        let mut table = SchedulingTable::new(2, 4, 2).unwrap();
        table.assign(1, 1, 0, a);
        table.assign(1, 2, 1, a);
        table.assign(1, 3, 0, a);

        let analytics = Analytics::collect(&system, &table);
        assert_eq!(analytics.counters(a).preemptions, 0);
        assert_eq!(analytics.counters(a).context_switches, 1);
        assert_eq!(analytics.total_preemptions(), 0);
    }

    #[test]
    fn activations_count_active_actors_per_level() {
        let system = system();
        let table = SchedulingTable::new(2, 8, 2).unwrap();
        let analytics = Analytics::collect(&system, &table);
        // LO: A, B twice each; HI: A twice
        assert_eq!(analytics.activations(), 6);
        assert_eq!(analytics.total_context_switches(), 0);
    }

    #[test]
    fn runs_are_counted_per_instance() {
        let system = system();
        let b = system.key_of("B").unwrap();
        let mut table = SchedulingTable::new(2, 8, 2).unwrap();
        // adjacent slots across an instance boundary are two dispatches
        table.assign(0, 3, 1, b);
        table.assign(0, 4, 1, b);

        let analytics = Analytics::collect(&system, &table);
        assert_eq!(analytics.counters(b).context_switches, 2);
        assert_eq!(analytics.counters(b).preemptions, 0);
        assert_eq!(analytics.iter().count(), 2);
    }
}
