/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Readiness tracking and remaining-time state for one level build.
//!
//! The tracker walks each graph in the build's [`Direction`]:
//!
//! | | entry actors | revealed after completion of `a` | gate |
//! |---|---|---|---|
//! | `Forward` (LO) | sources | successors of `a` | all active predecessors completed |
//! | `Backward` (HI) | sinks | predecessors of `a` | all active successors completed |
//!
//! Remaining time is reset to `WCET[L]` at every instance release of a graph.

use std::collections::HashSet;

use tracing::debug;

use super::table::Direction;
use crate::model::{ActorKey, Dag, Level, McSystem, Slot};

/// Ready list, completed set and remaining time of one level build.
///
/// Exclusively owned by the build that created it.
#[derive(Debug, Clone)]
pub struct ReadinessTracker {
    level: Level,
    direction: Direction,
    ready: Vec<ActorKey>,
    completed: HashSet<ActorKey>,
    // [graph][actor]
    remaining: Vec<Vec<Slot>>,
}

impl ReadinessTracker {
    /// State at the first step of `level`: remaining time set to `WCET[L]`
    /// and the entry actors of every graph ready.
    pub fn seed(system: &McSystem, level: Level) -> Self {
        let direction = Direction::for_level(level);
        let remaining = system
            .graphs()
            .iter()
            .map(|dag| dag.actors().iter().map(|a| a.wcet(level)).collect())
            .collect();

        let mut tracker = Self {
            level,
            direction,
            ready: Vec::new(),
            completed: HashSet::new(),
            remaining,
        };
        for (g, dag) in system.graphs().iter().enumerate() {
            tracker.push_entries(g, dag);
        }
        tracker
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Actors eligible for allocation now, in insertion order.
    pub fn ready(&self) -> &[ActorKey] {
        &self.ready
    }

    /// Execution units still owed by `key` in its current instance.
    pub fn remaining(&self, key: ActorKey) -> Slot {
        self.remaining[key.graph][key.actor]
    }

    pub fn is_completed(&self, key: ActorKey) -> bool {
        self.completed.contains(&key)
    }

    /// Account one slot of execution to `key`.
    ///
    /// Returns `true` when this slot completes the actor's current instance;
    /// the actor then leaves the ready list.
    pub fn consume(&mut self, key: ActorKey) -> bool {
        let left = &mut self.remaining[key.graph][key.actor];
        debug_assert!(*left > 0, "consume() on an actor with no remaining time");
        *left -= 1;
        if *left > 0 {
            return false;
        }
        self.ready.retain(|&k| k != key);
        self.completed.insert(key);
        true
    }

    /// Reveal the actors whose gate opened because every key in `finished`
    /// completed.
    pub fn activate_after(&mut self, system: &McSystem, finished: &[ActorKey]) {
        for &done in finished {
            let dag = system.graph(done.graph);
            let next: Vec<usize> = match self.direction {
                Direction::Forward => dag.successors(done.actor).to_vec(),
                Direction::Backward => dag.predecessors(done.actor).to_vec(),
            };

            for candidate in next {
                let key = ActorKey::new(done.graph, candidate);
                if !dag.actor(candidate).is_active(self.level)
                    || self.remaining(key) == 0
                    || self.ready.contains(&key)
                {
                    continue;
                }
                if self.gate_open(dag, key) {
                    debug!(
                        level = self.level,
                        actor = %dag.actor(candidate).name,
                        after = %dag.actor(done.actor).name,
                        "actor ready"
                    );
                    self.ready.push(key);
                }
            }
        }
    }

    /// Active actors of graph `g` that still owe execution in the current
    /// instance.
    pub fn unfinished(&self, system: &McSystem, g: usize) -> Vec<ActorKey> {
        system
            .graph(g)
            .actors()
            .iter()
            .filter(|a| a.is_active(self.level) && self.remaining[g][a.id] > 0)
            .map(|a| ActorKey::new(g, a.id))
            .collect()
    }

    /// Release a new instance of graph `g`: forget its completions, reset
    /// remaining time and make its entry actors ready again.
    pub fn reactivate(&mut self, system: &McSystem, g: usize) {
        let dag = system.graph(g);
        self.completed.retain(|k| k.graph != g);
        for actor in dag.actors() {
            self.remaining[g][actor.id] = actor.wcet(self.level);
        }
        self.push_entries(g, dag);
    }

    fn push_entries(&mut self, g: usize, dag: &Dag) {
        for actor in dag.actors() {
            let is_entry = match self.direction {
                Direction::Forward => dag.is_source(actor.id, self.level),
                Direction::Backward => dag.is_sink(actor.id, self.level),
            };
            let key = ActorKey::new(g, actor.id);
            if is_entry && !self.ready.contains(&key) {
                self.ready.push(key);
            }
        }
    }

    fn gate_open(&self, dag: &Dag, key: ActorKey) -> bool {
        let completed = |other: usize| self.completed.contains(&ActorKey::new(key.graph, other));
        match self.direction {
            Direction::Forward => dag.active_predecessors(key.actor, self.level).all(completed),
            Direction::Backward => dag.active_successors(key.actor, self.level).all(completed),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DagBuilder;

    /// A → C, B → C, C → D; only A, C, D run at level 1.
    fn join() -> McSystem {
        McSystem::builder(2, 2)
            .graph(
                DagBuilder::new(0, 6)
                    .actor("A", [1, 1])
                    .actor("B", [1, 0])
                    .actor("C", [2, 3])
                    .actor("D", [1, 1])
                    .edge("A", "C")
                    .edge("B", "C")
                    .edge("C", "D"),
            )
            .build()
            .unwrap()
    }

    fn k(sys: &McSystem, name: &str) -> ActorKey {
        sys.key_of(name).unwrap()
    }

    #[test]
    fn lo_seed_contains_sources_with_full_wcet() {
        let sys = join();
        let t = ReadinessTracker::seed(&sys, 0);
        assert_eq!(t.ready(), &[k(&sys, "A"), k(&sys, "B")]);
        assert_eq!(t.remaining(k(&sys, "C")), 2);
        assert_eq!(t.direction(), Direction::Forward);
    }

    #[test]
    fn hi_seed_contains_sinks() {
        let sys = join();
        let t = ReadinessTracker::seed(&sys, 1);
        assert_eq!(t.ready(), &[k(&sys, "D")]);
        assert_eq!(t.remaining(k(&sys, "C")), 3);
        assert_eq!(t.remaining(k(&sys, "B")), 0);
    }

    #[test]
    fn successor_waits_for_every_predecessor() {
        let sys = join();
        let mut t = ReadinessTracker::seed(&sys, 0);

        assert!(t.consume(k(&sys, "A")));
        t.activate_after(&sys, &[k(&sys, "A")]);
        assert_eq!(t.ready(), &[k(&sys, "B")], "C still waits for B");

        assert!(t.consume(k(&sys, "B")));
        t.activate_after(&sys, &[k(&sys, "B")]);
        assert_eq!(t.ready(), &[k(&sys, "C")]);
    }

    #[test]
    fn consume_only_completes_at_zero() {
        let sys = join();
        let mut t = ReadinessTracker::seed(&sys, 1);
        let d = k(&sys, "D");
        assert!(t.consume(d));
        t.activate_after(&sys, &[d]);

        let c = k(&sys, "C");
        assert_eq!(t.ready(), &[c]);
        assert!(!t.consume(c));
        assert!(!t.consume(c));
        assert_eq!(t.remaining(c), 1);
        assert!(t.ready().contains(&c));
        assert!(t.consume(c));
        assert!(t.is_completed(c));
        assert!(t.ready().is_empty());
    }

    #[test]
    fn backward_reveals_predecessors_active_at_level() {
        let sys = join();
        let mut t = ReadinessTracker::seed(&sys, 1);
        t.consume(k(&sys, "D"));
        t.activate_after(&sys, &[k(&sys, "D")]);
        for _ in 0..3 {
            t.consume(k(&sys, "C"));
        }
        t.activate_after(&sys, &[k(&sys, "C")]);
        // B does not run at level 1 and is never revealed.
        assert_eq!(t.ready(), &[k(&sys, "A")]);
    }

    #[test]
    fn reactivation_resets_remaining_and_reseeds_entries() {
        let sys = join();
        let mut t = ReadinessTracker::seed(&sys, 0);
        for name in ["A", "B"] {
            t.consume(k(&sys, name));
        }
        t.activate_after(&sys, &[k(&sys, "A"), k(&sys, "B")]);
        t.consume(k(&sys, "C"));
        assert_eq!(t.unfinished(&sys, 0), vec![k(&sys, "C"), k(&sys, "D")]);

        t.reactivate(&sys, 0);
        assert!(!t.is_completed(k(&sys, "A")));
        assert_eq!(t.remaining(k(&sys, "C")), 2);
        // C was still ready; A and B are appended without duplicating it.
        assert_eq!(t.ready(), &[k(&sys, "C"), k(&sys, "A"), k(&sys, "B")]);
    }

    #[test]
    fn finished_instance_has_no_unfinished_actors() {
        let sys = McSystem::builder(1, 1)
            .graph(DagBuilder::new(0, 2).actor("x", [1]))
            .build()
            .unwrap();
        let mut t = ReadinessTracker::seed(&sys, 0);
        assert!(t.consume(k(&sys, "x")));
        assert!(t.unfinished(&sys, 0).is_empty());
        assert!(t.ready().is_empty());
    }
}
