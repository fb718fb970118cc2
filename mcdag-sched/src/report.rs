/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Serializable view of a [`Schedule`], with actor names instead of keys.
//!
//! ```yaml
//! algorithm: least_laxity
//! hyperperiod: 4
//! cores: 1
//! tables:
//! - level: 1
//!   cores:
//!   - ['-', '-', A, A]
//! - level: 0
//!   cores:
//!   - [A, B, B, '-']
//! actors:
//!   A: { graph: 0, deadlines: [2, 4], preemptions: 0, context_switches: 2 }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::model::{McSystem, Slot};
use crate::scheduler::Schedule;

/// Marker for an idle cell.
pub const IDLE: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleReport {
    pub algorithm: String,
    pub hyperperiod: Slot,
    pub cores: usize,
    /// Highest level first.
    pub tables: Vec<LevelTable>,
    pub actors: BTreeMap<String, ActorReport>,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelTable {
    pub level: usize,
    /// `[core][slot]` actor names.
    pub cores: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorReport {
    pub graph: u32,
    /// Local deadline per level, `None` where the actor does not run.
    pub deadlines: Vec<Option<i64>>,
    pub preemptions: u64,
    pub context_switches: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub preemptions: u64,
    pub context_switches: u64,
    pub activations: u64,
}

impl ScheduleReport {
    pub fn new(system: &McSystem, schedule: &Schedule) -> Self {
        let table = &schedule.table;

        let tables = (0..table.levels())
            .rev()
            .map(|level| LevelTable {
                level,
                cores: (0..table.cores())
                    .map(|core| {
                        (0..table.hyperperiod())
                            .map(|slot| match table.get(level, slot, core) {
                                Some(key) => system.name(key).to_string(),
                                None => IDLE.to_string(),
                            })
                            .collect()
                    })
                    .collect(),
            })
            .collect();

        let actors = schedule
            .analytics
            .iter()
            .map(|(key, counters)| {
                let actor = system.actor(key);
                let report = ActorReport {
                    graph: actor.graph_id,
                    deadlines: (0..system.levels())
                        .map(|level| schedule.deadlines.get(level, key))
                        .collect(),
                    preemptions: counters.preemptions,
                    context_switches: counters.context_switches,
                };
                (actor.name.clone(), report)
            })
            .collect();

        Self {
            algorithm: schedule.algorithm.clone(),
            hyperperiod: table.hyperperiod(),
            cores: table.cores(),
            tables,
            actors,
            totals: Totals {
                preemptions: schedule.analytics.total_preemptions(),
                context_switches: schedule.analytics.total_context_switches(),
                activations: schedule.analytics.activations(),
            },
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Plain-text rendering: one row per core, then per-actor counters.
impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "algorithm: {}  hyperperiod: {}  cores: {}",
            self.algorithm, self.hyperperiod, self.cores
        )?;
        let width = self.actors.keys().map(String::len).max().unwrap_or(1);

        for table in &self.tables {
            writeln!(f, "level {}:", table.level)?;
            for (core, row) in table.cores.iter().enumerate() {
                write!(f, "  core {core:>2} |")?;
                for name in row {
                    write!(f, " {name:<width$} |")?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "actors:")?;
        for (name, actor) in &self.actors {
            writeln!(
                f,
                "  {name:<width$}  preemptions: {}  context switches: {}",
                actor.preemptions, actor.context_switches
            )?;
        }
        write!(
            f,
            "total: {} preemptions, {} context switches, {} activations",
            self.totals.preemptions, self.totals.context_switches, self.totals.activations
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
