/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Table builder for mixed-criticality DAG systems.
//!
//! [`McScheduler`] turns an [`McSystem`] into one static [`SchedulingTable`]
//! per criticality level, filling it slot by slot with the actors a
//! [`PriorityPolicy`] ranks most urgent.
//!
//! # Build order
//!
//! | Level | Direction | Reads |
//! |---|---|---|
//! | `N-1` … `1` | backward, last slot first | table of `L+1` (forced delay) |
//! | `0` (LO) | forward, slot `0` first | table of level `1` (promotion) |
//!
//! Each HI table is therefore finished before the level below it starts, and
//! LO is built last.
//!
//! # Design decisions
//!
//! | Topic | Choice |
//! |---|---|
//! | State | Stateless `build()`; tracker and table are local to the call |
//! | Tie-break | `(weight, ActorKey)`, key descending on HI levels |
//! | Errors | `Result<Schedule, SchedulerError>` with the level and slot that failed |
//! | Thread safety | `Send + Sync`; independent systems can be built in parallel |
//!
//! # Example
//! ```rust
//! use mcdag_sched::model::{DagBuilder, McSystem};
//! use mcdag_sched::scheduler::{Algorithm, McScheduler};
//!
//! let system = McSystem::builder(1, 2)
//!     .graph(
//!         DagBuilder::new(0, 4)
//!             .actor("A", [1, 2])
//!             .actor("B", [2, 0])
//!             .edge("A", "B"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let schedule = McScheduler::new(Algorithm::LeastLaxity).build(&system).unwrap();
//! assert_eq!(schedule.hyperperiod.hyperperiod, 4);
//! ```

pub mod deadline;
pub mod error;
pub mod feasibility;
pub mod priority;
pub mod ready;
pub mod table;

pub use deadline::LocalDeadlines;
pub use error::{InfeasibilityReason, SchedulerError};
pub use priority::{Algorithm, Hybrid, LeastLaxityFirst, PriorityPolicy, SlotView, Weight};
pub use ready::ReadinessTracker;
pub use table::{Direction, SchedulingTable, MAX_TABLE_CELLS};

use std::iter;

use tracing::{debug, info, warn};

use crate::analytics::Analytics;
use crate::hyperperiod::{HyperperiodCalculator, HyperperiodInfo};
use crate::model::{Level, McSystem, Slot, LO};

use feasibility::level_load;
use priority::{MUST_WAIT, URGENT};

// ── Schedule ──────────────────────────────────────────────────────────────────

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Name of the policy that ranked the ready lists.
    pub algorithm: String,
    pub hyperperiod: HyperperiodInfo,
    pub table: SchedulingTable,
    pub deadlines: LocalDeadlines,
    pub analytics: Analytics,
}

// ── McScheduler ───────────────────────────────────────────────────────────────

/// Builds scheduling tables for any number of systems.
///
/// Holds only the policy and the hyperperiod limit.  All per-build state
/// (tracker, table) is allocated inside [`build()`](Self::build).
pub struct McScheduler {
    policy: Box<dyn PriorityPolicy>,
    hyperperiod: HyperperiodCalculator,
}

impl McScheduler {
    /// Scheduler running the policy of `algorithm`.
    pub fn new(algorithm: Algorithm) -> Self {
        Self::with_policy(algorithm.policy())
    }

    /// Scheduler running a custom policy.
    pub fn with_policy(policy: Box<dyn PriorityPolicy>) -> Self {
        Self {
            policy,
            hyperperiod: HyperperiodCalculator::new(),
        }
    }

    /// Reject systems whose hyperperiod exceeds `limit` slots.
    pub fn with_hyperperiod_limit(mut self, limit: Slot) -> Self {
        self.hyperperiod = HyperperiodCalculator::with_limit(limit);
        self
    }

    // ── Public entry point ────────────────────────────────────────────────────

    /// Build every level of `system`.
    ///
    /// # Errors
    /// * [`SchedulerError::Hyperperiod`] – the periods' LCM is unusable.
    /// * [`SchedulerError::Model`] – an active actor has no local deadline.
    /// * [`SchedulerError::TableTooLarge`] – `levels × hyperperiod × cores`
    ///   cells cannot be allocated.
    /// * [`SchedulerError::Infeasible`] – some level has no valid table under
    ///   this policy.
    pub fn build(&self, system: &McSystem) -> Result<Schedule, SchedulerError> {
        let hyperperiod = self.hyperperiod.calculate(system.graphs())?;
        let deadlines = LocalDeadlines::compute(system)?;
        let h = hyperperiod.hyperperiod;

        info!(
            algorithm = self.policy.name(),
            hyperperiod = h,
            cores = system.cores(),
            levels = system.levels(),
            graphs = system.graphs().len(),
            actors = system.actor_count(),
            "=== McScheduler::build() ==="
        );

        let mut table = SchedulingTable::new(system.levels(), h, system.cores())?;
        for level in (1..system.levels()).rev().chain(iter::once(LO)) {
            self.build_level(system, &deadlines, &mut table, level)?;
        }

        debug!("tables:\n{}", table.display(system));

        let analytics = Analytics::collect(system, &table);
        info!(
            preemptions = analytics.total_preemptions(),
            context_switches = analytics.total_context_switches(),
            activations = analytics.activations(),
            "=== Build complete ==="
        );

        Ok(Schedule {
            algorithm: self.policy.name().to_string(),
            hyperperiod,
            table,
            deadlines,
            analytics,
        })
    }

    // ── One level ─────────────────────────────────────────────────────────────

    fn build_level(
        &self,
        system: &McSystem,
        deadlines: &LocalDeadlines,
        table: &mut SchedulingTable,
        level: Level,
    ) -> Result<(), SchedulerError> {
        let h = table.hyperperiod();
        let direction = Direction::for_level(level);

        let load = level_load(system, level, h);
        info!(
            level = load.level,
            direction = ?direction,
            demand = load.demand,
            capacity = load.capacity,
            utilization = load.utilization(h),
            "Building level"
        );
        if load.active_actors == 0 {
            warn!(level = load.level, "no actor is active at this level, table left idle");
            return Ok(());
        }
        if load.utilization(h) > 1.0 {
            warn!(
                level = load.level,
                utilization = load.utilization(h),
                cores = system.cores(),
                "level needs more than one core"
            );
        }
        if !load.fits() {
            return Err(SchedulerError::Infeasible {
                level: load.level,
                slot: 0,
                reason: InfeasibilityReason::DemandExceedsCapacity {
                    demand: load.demand,
                    capacity: load.capacity,
                },
            });
        }

        let mut tracker = ReadinessTracker::seed(system, level);
        let cores = direction.core_order(system.cores());
        let mut busy: Slot = 0;

        for step in 0..h {
            let slot = direction.slot_at(step, h);
            if step > 0 {
                release_instances(system, &mut tracker, step, slot)?;
            }

            let ranked = {
                let view = SlotView {
                    system,
                    deadlines,
                    table: &*table,
                    tracker: &tracker,
                    level,
                    step,
                };
                self.policy.rank(&view, tracker.ready())
            };
            debug!(
                level,
                slot,
                ready = ?ranked.iter().map(|&(k, w)| (system.name(k), w)).collect::<Vec<_>>(),
                "ranked"
            );

            if let Some(&(key, weight)) = ranked.iter().find(|&&(_, w)| w < 0) {
                return Err(SchedulerError::Infeasible {
                    level,
                    slot,
                    reason: InfeasibilityReason::NegativeWeight {
                        actor: system.name(key).to_string(),
                        weight,
                    },
                });
            }
            let urgent = ranked.iter().filter(|&&(_, w)| w == URGENT).count();
            if urgent > system.cores() {
                return Err(SchedulerError::Infeasible {
                    level,
                    slot,
                    reason: InfeasibilityReason::TooManyUrgent {
                        urgent,
                        cores: system.cores(),
                    },
                });
            }

            let mut finished = Vec::new();
            for (&core, &(key, weight)) in cores.iter().zip(ranked.iter()) {
                if weight == MUST_WAIT {
                    break;
                }
                table.assign(level, slot, core, key);
                busy += 1;
                debug!(level, slot, core, actor = %system.name(key), "assigned");
                if tracker.consume(key) {
                    finished.push(key);
                }
            }
            tracker.activate_after(system, &finished);
        }

        let last = direction.slot_at(h - 1, h);
        for g in 0..system.graphs().len() {
            check_finished(system, &tracker, g, last)?;
        }

        info!(
            level = load.level,
            busy_slots = busy,
            idle_slots = load.capacity - busy,
            "Level complete"
        );
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instance boundaries
// ─────────────────────────────────────────────────────────────────────────────

/// Release a new instance of every graph whose period divides `step`.
///
/// The previous instance must be complete; leftover work cannot spill into
/// the next one.
fn release_instances(
    system: &McSystem,
    tracker: &mut ReadinessTracker,
    step: Slot,
    slot: Slot,
) -> Result<(), SchedulerError> {
    for (g, dag) in system.graphs().iter().enumerate() {
        if step % dag.period() != 0 {
            continue;
        }
        check_finished(system, tracker, g, slot)?;
        tracker.reactivate(system, g);
        debug!(level = tracker.level(), slot, graph = dag.id(), "instance released");
    }
    Ok(())
}

fn check_finished(
    system: &McSystem,
    tracker: &ReadinessTracker,
    g: usize,
    slot: Slot,
) -> Result<(), SchedulerError> {
    let unfinished = tracker.unfinished(system, g);
    if unfinished.is_empty() {
        return Ok(());
    }
    Err(SchedulerError::Infeasible {
        level: tracker.level(),
        slot,
        reason: InfeasibilityReason::UnfinishedWork {
            actors: unfinished
                .into_iter()
                .map(|k| system.name(k).to_string())
                .collect(),
        },
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
