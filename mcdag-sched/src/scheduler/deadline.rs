/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Local deadline propagation.
//!
//! For every level `L` and every actor active at `L`:
//!
//! ```text
//! deadline[L](sink) = period
//! deadline[L](a)    = min over active successors s of (deadline[L](s) − WCET[L](s))
//! ```
//!
//! The traversal starts at the sinks of the active subgraph and walks
//! received edges backward.  A predecessor is queued only once *all* of its
//! active successors have a deadline, so fan-in nodes are never evaluated
//! early.

use std::collections::VecDeque;

use tracing::debug;

use crate::model::{ActorKey, Dag, Level, McSystem, ModelError};

/// Per-level local deadlines of every actor, relative to the start of its
/// graph instance.
///
/// Values are signed: a chain longer than its period yields negative
/// deadlines, which the table builder then reports as infeasible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDeadlines {
    // [level][graph][actor]
    per_level: Vec<Vec<Vec<Option<i64>>>>,
}

impl LocalDeadlines {
    /// Propagate deadlines for every graph at every level.
    ///
    /// # Errors
    /// [`ModelError::MissingDeadline`] if an actor active at some level was
    /// never reached from a sink of that level.
    pub fn compute(system: &McSystem) -> Result<Self, ModelError> {
        let mut per_level = Vec::with_capacity(system.levels());

        for level in 0..system.levels() {
            let graphs: Vec<Vec<Option<i64>>> =
                system.graphs().iter().map(|dag| propagate(dag, level)).collect();

            for (g, dag) in system.graphs().iter().enumerate() {
                for actor in dag.actors() {
                    let deadline = graphs[g][actor.id];
                    if actor.is_active(level) && deadline.is_none() {
                        return Err(ModelError::MissingDeadline {
                            actor: actor.name.clone(),
                            level,
                        });
                    }
                    if let Some(d) = deadline {
                        debug!(level, actor = %actor.name, deadline = d, "local deadline");
                    }
                }
            }
            per_level.push(graphs);
        }

        Ok(Self { per_level })
    }

    /// Deadline of `key` at `level`; `None` when the actor does not run there.
    pub fn get(&self, level: Level, key: ActorKey) -> Option<i64> {
        self.per_level
            .get(level)
            .and_then(|g| g.get(key.graph))
            .and_then(|a| a.get(key.actor))
            .copied()
            .flatten()
    }
}

/// Deadlines of one graph at one level, indexed by actor id.
///
/// Inactive actors, and active actors not reachable backward from a sink,
/// are left as `None`.
pub fn propagate(dag: &Dag, level: Level) -> Vec<Option<i64>> {
    let n = dag.actors().len();
    let period = dag.period() as i64;
    let mut deadline: Vec<Option<i64>> = vec![None; n];
    let mut queued = vec![false; n];

    let mut worklist: VecDeque<usize> = (0..n).filter(|&a| dag.is_sink(a, level)).collect();
    for &a in &worklist {
        queued[a] = true;
    }

    while let Some(a) = worklist.pop_front() {
        let value = dag
            .active_successors(a, level)
            .map(|s| {
                let succ_deadline = deadline[s].unwrap_or(i64::MAX);
                succ_deadline.saturating_sub(dag.actor(s).wcet(level) as i64)
            })
            .min()
            .unwrap_or(period);
        deadline[a] = Some(value);

        for p in dag.active_predecessors(a, level) {
            if queued[p] {
                continue;
            }
            if dag.active_successors(p, level).all(|s| deadline[s].is_some()) {
                queued[p] = true;
                worklist.push_back(p);
            }
        }
    }

    deadline
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DagBuilder, McSystem};

    fn chain() -> McSystem {
        McSystem::builder(1, 2)
            .graph(
                DagBuilder::new(0, 4)
                    .actor("A", [1, 2])
                    .actor("B", [2, 0])
                    .edge("A", "B"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn sink_gets_period_and_predecessor_gets_slack() {
        let sys = chain();
        let d = propagate(sys.graph(0), 0);
        assert_eq!(d, vec![Some(2), Some(4)]);
    }

    #[test]
    fn hi_level_uses_only_the_active_subgraph() {
        let sys = chain();
        // B does not run at level 1, so A is a sink there.
        let d = propagate(sys.graph(0), 1);
        assert_eq!(d, vec![Some(4), None]);
    }

    #[test]
    fn fan_in_waits_for_every_successor() {
        //      ┌─► B (3) ─┐
        //  A ──┤          ├─► D (1)
        //      └─► C (1) ─┘
        let sys = McSystem::builder(2, 1)
            .graph(
                DagBuilder::new(0, 10)
                    .actor("A", [1])
                    .actor("B", [3])
                    .actor("C", [1])
                    .actor("D", [1])
                    .edge("A", "B")
                    .edge("A", "C")
                    .edge("B", "D")
                    .edge("C", "D"),
            )
            .build()
            .unwrap();
        let d = propagate(sys.graph(0), 0);
        // D = 10, B = C = 10 - 1 = 9, A = min(9 - 3, 9 - 1) = 6
        assert_eq!(d, vec![Some(6), Some(9), Some(9), Some(10)]);
    }

    #[test]
    fn chain_longer_than_period_yields_negative_deadline() {
        let sys = McSystem::builder(1, 1)
            .graph(
                DagBuilder::new(0, 3)
                    .actor("A", [2])
                    .actor("B", [3])
                    .edge("A", "B"),
            )
            .build()
            .unwrap();
        assert_eq!(propagate(sys.graph(0), 0), vec![Some(0), Some(3)]);

        let sys = McSystem::builder(1, 1)
            .graph(
                DagBuilder::new(0, 3)
                    .actor("A", [2])
                    .actor("B", [4])
                    .edge("A", "B"),
            )
            .build()
            .unwrap();
        assert_eq!(propagate(sys.graph(0), 0), vec![Some(-1), Some(3)]);
    }

    #[test]
    fn compute_covers_every_level_and_graph() {
        let sys = McSystem::builder(1, 2)
            .graph(DagBuilder::new(0, 4).actor("A", [1, 2]).actor("B", [2, 0]).edge("A", "B"))
            .graph(DagBuilder::new(1, 8).actor("C", [3, 5]))
            .build()
            .unwrap();
        let d = LocalDeadlines::compute(&sys).unwrap();
        let a = sys.key_of("A").unwrap();
        let b = sys.key_of("B").unwrap();
        let c = sys.key_of("C").unwrap();

        assert_eq!(d.get(0, a), Some(2));
        assert_eq!(d.get(1, a), Some(4));
        assert_eq!(d.get(0, b), Some(4));
        assert_eq!(d.get(1, b), None);
        assert_eq!(d.get(0, c), Some(8));
        assert_eq!(d.get(1, c), Some(8));
        assert_eq!(d.get(7, c), None);
    }
}
