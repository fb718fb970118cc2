/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Mixed-criticality DAG task model.
//!
//! ```text
//!   producer ──(SystemBuilder)──►  McSystem  ──(McScheduler)──►  Schedule
//!                                   ↑ immutable                   ↑ tables + analytics
//!                                   shared by every build          owned by one build
//! ```
//!
//! # Ownership model
//! An [`McSystem`] is **read-only** once built.  Every piece of mutable
//! scheduling state (remaining time, ready lists, priority weights, delay
//! flags) lives inside one call to
//! [`McScheduler::build()`](crate::scheduler::McScheduler::build), so the
//! same system can be scheduled by several callers at once.
//!
//! # Criticality levels
//! Levels are numbered `0 = LO … N-1 = highest`.  An actor whose WCET at
//! level `L` is `0` does not execute at that level; the active subgraph at
//! `L` is made of the actors with `WCET[L] > 0`.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;
use tracing::debug;

// ── Scalar types ──────────────────────────────────────────────────────────────

/// Time, in table slots.  Periods, WCETs and the hyperperiod share this unit.
pub type Slot = u64;

/// Criticality level index (`0` = LO).
pub type Level = usize;

/// The lowest criticality level.
pub const LO: Level = 0;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Model-invariant violations.
///
/// These are input errors from the graph producer, not scheduling outcomes:
/// they are reported before any table slot is filled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("system has no cores")]
    NoCores,

    #[error("system has no criticality levels")]
    NoLevels,

    #[error("system has no graphs")]
    NoGraphs,

    #[error("graph {graph} has no actors")]
    EmptyGraph { graph: u32 },

    #[error("graph {graph} has a zero period")]
    ZeroPeriod { graph: u32 },

    #[error("graph id {graph} is used more than once")]
    DuplicateGraphId { graph: u32 },

    #[error("actor name '{name}' is used more than once")]
    DuplicateActorName { name: String },

    #[error("actor '{actor}' has {found} WCET value(s), expected one per level ({expected})")]
    WcetLevelMismatch {
        actor: String,
        expected: usize,
        found: usize,
    },

    #[error("actor '{actor}' has a zero LO WCET; every actor must execute in LO mode")]
    ZeroLoWcet { actor: String },

    #[error("graph {graph} has an edge referring to unknown actor '{name}'")]
    UnknownActor { graph: u32, name: String },

    #[error("actor '{actor}' has an edge to itself")]
    SelfLoop { actor: String },

    #[error("edge '{src}' -> '{dst}' is declared more than once")]
    DuplicateEdge { src: String, dst: String },

    #[error("graph {graph} contains a cycle")]
    Cyclic { graph: u32 },

    #[error("actor '{actor}' executes at level {level} but has no local deadline there")]
    MissingDeadline { actor: String, level: Level },
}

// ── ActorKey ──────────────────────────────────────────────────────────────────

/// System-wide identity of an actor: graph index plus actor id within the
/// graph.
///
/// Ordering is lexicographic on `(graph, actor)`; the table builder uses it
/// as the deterministic tie-break between equal priority weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorKey {
    /// Index of the owning graph inside [`McSystem::graphs`].
    pub graph: usize,
    /// Actor id, unique within its graph.
    pub actor: usize,
}

impl ActorKey {
    pub fn new(graph: usize, actor: usize) -> Self {
        Self { graph, actor }
    }
}

// ── Actor ─────────────────────────────────────────────────────────────────────

/// A task node of a DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Id within the graph (equal to the actor's index).
    pub id: usize,

    /// Name, unique system-wide.  Used as the cell identity in reports.
    pub name: String,

    /// Marks a fault-tolerance mechanism.  Carried for downstream
    /// dependability tooling; the table builder ignores it.
    pub fault_tolerance: bool,

    /// Id of the owning graph.
    pub graph_id: u32,

    /// Period of the owning graph.
    pub graph_period: Slot,

    wcets: Vec<Slot>,
}

impl Actor {
    /// WCET at `level`, `0` when the actor does not run there.
    pub fn wcet(&self, level: Level) -> Slot {
        self.wcets.get(level).copied().unwrap_or(0)
    }

    /// All WCETs, indexed by level.
    pub fn wcets(&self) -> &[Slot] {
        &self.wcets
    }

    /// `true` if the actor executes at `level`.
    pub fn is_active(&self, level: Level) -> bool {
        self.wcet(level) > 0
    }
}

// ── Edge ──────────────────────────────────────────────────────────────────────

/// Precedence constraint `src → dst`, by actor id within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub src: usize,
    pub dst: usize,
}

// ── Dag ───────────────────────────────────────────────────────────────────────

/// One periodic task graph.
///
/// Adjacency is stored twice, as the "sent" (successor) and "received"
/// (predecessor) sets of every actor, so both forward and backward
/// traversals are O(degree).
#[derive(Debug, Clone)]
pub struct Dag {
    id: u32,
    period: Slot,
    actors: Vec<Actor>,
    edges: Vec<Edge>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

impl Dag {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Period, which is also the graph's deadline and reactivation interval.
    pub fn period(&self) -> Slot {
        self.period
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, id: usize) -> &Actor {
        &self.actors[id]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn successors(&self, id: usize) -> &[usize] {
        &self.successors[id]
    }

    pub fn predecessors(&self, id: usize) -> &[usize] {
        &self.predecessors[id]
    }

    /// Successors of `id` that execute at `level`.
    pub fn active_successors(&self, id: usize, level: Level) -> impl Iterator<Item = usize> + '_ {
        self.successors[id]
            .iter()
            .copied()
            .filter(move |&s| self.actors[s].is_active(level))
    }

    /// Predecessors of `id` that execute at `level`.
    pub fn active_predecessors(
        &self,
        id: usize,
        level: Level,
    ) -> impl Iterator<Item = usize> + '_ {
        self.predecessors[id]
            .iter()
            .copied()
            .filter(move |&p| self.actors[p].is_active(level))
    }

    /// Active at `level` with no active successor.
    pub fn is_sink(&self, id: usize, level: Level) -> bool {
        self.actors[id].is_active(level) && self.active_successors(id, level).next().is_none()
    }

    /// Active at `level` with no active predecessor.
    pub fn is_source(&self, id: usize, level: Level) -> bool {
        self.actors[id].is_active(level) && self.active_predecessors(id, level).next().is_none()
    }

}

// ── McSystem ──────────────────────────────────────────────────────────────────

/// A validated set of graphs together with the platform (core count) and the
/// number of criticality levels.
#[derive(Debug, Clone)]
pub struct McSystem {
    graphs: Vec<Dag>,
    cores: usize,
    levels: usize,
    by_name: HashMap<String, ActorKey>,
}

impl McSystem {
    /// Start building a system for `cores` cores and `levels` criticality
    /// levels.
    pub fn builder(cores: usize, levels: usize) -> SystemBuilder {
        SystemBuilder {
            cores,
            levels,
            graphs: Vec::new(),
        }
    }

    pub fn graphs(&self) -> &[Dag] {
        &self.graphs
    }

    pub fn graph(&self, index: usize) -> &Dag {
        &self.graphs[index]
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn actor(&self, key: ActorKey) -> &Actor {
        self.graphs[key.graph].actor(key.actor)
    }

    /// Name of the actor behind `key`.
    pub fn name(&self, key: ActorKey) -> &str {
        &self.actor(key).name
    }

    pub fn key_of(&self, name: &str) -> Option<ActorKey> {
        self.by_name.get(name).copied()
    }

    /// Every actor of every graph, in `ActorKey` order.
    pub fn keys(&self) -> impl Iterator<Item = ActorKey> + '_ {
        self.graphs
            .iter()
            .enumerate()
            .flat_map(|(g, dag)| (0..dag.actors.len()).map(move |a| ActorKey::new(g, a)))
    }

    /// Total number of actors across all graphs.
    pub fn actor_count(&self) -> usize {
        self.graphs.iter().map(|d| d.actors.len()).sum()
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Declarative description of one graph, consumed by [`SystemBuilder`].
///
/// Actors get their id from declaration order; edges refer to actors by
/// name.
#[derive(Debug, Clone)]
pub struct DagBuilder {
    id: u32,
    period: Slot,
    actors: Vec<(String, Vec<Slot>, bool)>,
    edges: Vec<(String, String)>,
}

impl DagBuilder {
    pub fn new(id: u32, period: Slot) -> Self {
        Self {
            id,
            period,
            actors: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Add an actor with one WCET per criticality level.
    pub fn actor(self, name: impl Into<String>, wcets: impl Into<Vec<Slot>>) -> Self {
        self.actor_with(name, wcets, false)
    }

    /// Add an actor, optionally tagged as a fault-tolerance mechanism.
    pub fn actor_with(
        mut self,
        name: impl Into<String>,
        wcets: impl Into<Vec<Slot>>,
        fault_tolerance: bool,
    ) -> Self {
        self.actors.push((name.into(), wcets.into(), fault_tolerance));
        self
    }

    /// Add a precedence edge `src → dst`.
    pub fn edge(mut self, src: impl Into<String>, dst: impl Into<String>) -> Self {
        self.edges.push((src.into(), dst.into()));
        self
    }
}

/// Collects graphs and validates them into an [`McSystem`].
#[derive(Debug, Clone)]
pub struct SystemBuilder {
    cores: usize,
    levels: usize,
    graphs: Vec<DagBuilder>,
}

impl SystemBuilder {
    pub fn graph(mut self, dag: DagBuilder) -> Self {
        self.graphs.push(dag);
        self
    }

    /// Validate every model precondition and assemble the system.
    ///
    /// # Errors
    /// The first [`ModelError`] found, checked in declaration order.
    pub fn build(self) -> Result<McSystem, ModelError> {
        if self.cores == 0 {
            return Err(ModelError::NoCores);
        }
        if self.levels == 0 {
            return Err(ModelError::NoLevels);
        }
        if self.graphs.is_empty() {
            return Err(ModelError::NoGraphs);
        }

        let mut graph_ids = HashSet::new();
        let mut by_name: HashMap<String, ActorKey> = HashMap::new();
        let mut graphs = Vec::with_capacity(self.graphs.len());

        for (g, decl) in self.graphs.into_iter().enumerate() {
            if !graph_ids.insert(decl.id) {
                return Err(ModelError::DuplicateGraphId { graph: decl.id });
            }
            if decl.period == 0 {
                return Err(ModelError::ZeroPeriod { graph: decl.id });
            }
            if decl.actors.is_empty() {
                return Err(ModelError::EmptyGraph { graph: decl.id });
            }

            let mut actors = Vec::with_capacity(decl.actors.len());
            let mut local: HashMap<String, usize> = HashMap::new();
            for (id, (name, wcets, fault_tolerance)) in decl.actors.into_iter().enumerate() {
                if by_name.contains_key(&name) {
                    return Err(ModelError::DuplicateActorName { name });
                }
                if wcets.len() != self.levels {
                    return Err(ModelError::WcetLevelMismatch {
                        actor: name,
                        expected: self.levels,
                        found: wcets.len(),
                    });
                }
                if wcets[LO] == 0 {
                    return Err(ModelError::ZeroLoWcet { actor: name });
                }
                by_name.insert(name.clone(), ActorKey::new(g, id));
                local.insert(name.clone(), id);
                actors.push(Actor {
                    id,
                    name,
                    fault_tolerance,
                    graph_id: decl.id,
                    graph_period: decl.period,
                    wcets,
                });
            }

            let mut edges = Vec::with_capacity(decl.edges.len());
            let mut seen = HashSet::new();
            let mut successors = vec![Vec::new(); actors.len()];
            let mut predecessors = vec![Vec::new(); actors.len()];
            for (src, dst) in decl.edges {
                let resolve = |name: &str| {
                    local.get(name).copied().ok_or_else(|| ModelError::UnknownActor {
                        graph: decl.id,
                        name: name.to_string(),
                    })
                };
                let s = resolve(&src)?;
                let d = resolve(&dst)?;
                if s == d {
                    return Err(ModelError::SelfLoop { actor: src });
                }
                if !seen.insert((s, d)) {
                    return Err(ModelError::DuplicateEdge { src, dst });
                }
                successors[s].push(d);
                predecessors[d].push(s);
                edges.push(Edge { src: s, dst: d });
            }

            let dag = Dag {
                id: decl.id,
                period: decl.period,
                actors,
                edges,
                successors,
                predecessors,
            };
            if !is_acyclic(&dag) {
                return Err(ModelError::Cyclic { graph: dag.id });
            }

            debug!(
                graph = dag.id,
                period = dag.period,
                actors = dag.actors.len(),
                edges = dag.edges.len(),
                "graph accepted"
            );
            graphs.push(dag);
        }

        Ok(McSystem {
            graphs,
            cores: self.cores,
            levels: self.levels,
            by_name,
        })
    }
}

/// Kahn's algorithm: the graph is acyclic iff every node can be popped.
fn is_acyclic(dag: &Dag) -> bool {
    let mut in_degree: Vec<usize> = dag.predecessors.iter().map(Vec::len).collect();
    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(i, _)| i)
        .collect();
    let mut popped = 0usize;

    while let Some(n) = queue.pop_front() {
        popped += 1;
        for &s in &dag.successors[n] {
            in_degree[s] -= 1;
            if in_degree[s] == 0 {
                queue.push_back(s);
            }
        }
    }

    popped == dag.actors.len()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A → B, A → C, B → D, C → D with a HI subgraph A → B → D.
    fn diamond() -> McSystem {
        McSystem::builder(2, 2)
            .graph(
                DagBuilder::new(7, 10)
                    .actor("A", [1, 2])
                    .actor("B", [2, 3])
                    .actor("C", [1, 0])
                    .actor_with("D", [1, 2], true)
                    .edge("A", "B")
                    .edge("A", "C")
                    .edge("B", "D")
                    .edge("C", "D"),
            )
            .build()
            .unwrap()
    }

    // ── Structure ─────────────────────────────────────────────────────────────

    #[test]
    fn builder_assigns_ids_in_declaration_order() {
        let sys = diamond();
        let dag = sys.graph(0);
        assert_eq!(dag.id(), 7);
        assert_eq!(dag.period(), 10);
        for (i, a) in dag.actors().iter().enumerate() {
            assert_eq!(a.id, i);
            assert_eq!(a.graph_id, 7);
            assert_eq!(a.graph_period, 10);
        }
        assert_eq!(sys.key_of("C"), Some(ActorKey::new(0, 2)));
        assert_eq!(sys.name(ActorKey::new(0, 3)), "D");
        assert!(sys.actor(ActorKey::new(0, 3)).fault_tolerance);
    }

    #[test]
    fn adjacency_is_recorded_both_ways() {
        let sys = diamond();
        let dag = sys.graph(0);
        assert_eq!(dag.successors(0), &[1, 2]);
        assert_eq!(dag.predecessors(3), &[1, 2]);
        assert_eq!(dag.edges().len(), 4);
    }

    #[test]
    fn sources_and_sinks_depend_on_level() {
        let sys = diamond();
        let dag = sys.graph(0);

        assert!(dag.is_source(0, LO));
        assert!(dag.is_sink(3, LO));
        assert!(!dag.is_sink(2, LO));

        // C is inactive at level 1: it is neither a source nor a sink there,
        // and D only sees B as an active predecessor.
        assert!(!dag.is_sink(2, 1));
        assert!(!dag.is_source(2, 1));
        assert_eq!(dag.active_predecessors(3, 1).collect::<Vec<_>>(), vec![1]);
        assert!(dag.is_sink(3, 1));
    }

    #[test]
    fn wcet_outside_known_levels_is_zero() {
        let sys = diamond();
        let a = sys.actor(ActorKey::new(0, 0));
        assert_eq!(a.wcet(1), 2);
        assert_eq!(a.wcet(5), 0);
        assert!(!a.is_active(5));
    }

    #[test]
    fn keys_enumerate_every_actor_in_order() {
        let sys = McSystem::builder(1, 1)
            .graph(DagBuilder::new(0, 4).actor("a", [1]).actor("b", [1]))
            .graph(DagBuilder::new(1, 8).actor("c", [1]))
            .build()
            .unwrap();
        let keys: Vec<_> = sys.keys().collect();
        assert_eq!(
            keys,
            vec![ActorKey::new(0, 0), ActorKey::new(0, 1), ActorKey::new(1, 0)]
        );
        assert_eq!(sys.actor_count(), 3);
    }

    // ── Preconditions ─────────────────────────────────────────────────────────

    #[test]
    fn zero_cores_is_rejected() {
        let err = McSystem::builder(0, 1)
            .graph(DagBuilder::new(0, 4).actor("a", [1]))
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::NoCores);
    }

    #[test]
    fn empty_system_is_rejected() {
        assert_eq!(McSystem::builder(1, 1).build().unwrap_err(), ModelError::NoGraphs);
    }

    #[test]
    fn duplicate_names_across_graphs_are_rejected() {
        let err = McSystem::builder(1, 1)
            .graph(DagBuilder::new(0, 4).actor("a", [1]))
            .graph(DagBuilder::new(1, 4).actor("a", [1]))
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateActorName { name } if name == "a"));
    }

    #[test]
    fn duplicate_graph_ids_are_rejected() {
        let err = McSystem::builder(1, 1)
            .graph(DagBuilder::new(3, 4).actor("a", [1]))
            .graph(DagBuilder::new(3, 4).actor("b", [1]))
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicateGraphId { graph: 3 });
    }

    #[test]
    fn wcet_vector_must_match_level_count() {
        let err = McSystem::builder(1, 2)
            .graph(DagBuilder::new(0, 4).actor("a", [1]))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::WcetLevelMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn zero_lo_wcet_is_rejected() {
        let err = McSystem::builder(1, 2)
            .graph(DagBuilder::new(0, 4).actor("a", [0, 2]))
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::ZeroLoWcet { .. }));
    }

    #[test]
    fn zero_period_is_rejected() {
        let err = McSystem::builder(1, 1)
            .graph(DagBuilder::new(0, 0).actor("a", [1]))
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::ZeroPeriod { graph: 0 });
    }

    #[test]
    fn edges_to_unknown_actors_are_rejected() {
        let err = McSystem::builder(1, 1)
            .graph(DagBuilder::new(0, 4).actor("a", [1]).edge("a", "ghost"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownActor { name, .. } if name == "ghost"));
    }

    #[test]
    fn self_loops_and_duplicate_edges_are_rejected() {
        let err = McSystem::builder(1, 1)
            .graph(DagBuilder::new(0, 4).actor("a", [1]).edge("a", "a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::SelfLoop { .. }));

        let err = McSystem::builder(1, 1)
            .graph(
                DagBuilder::new(0, 4)
                    .actor("a", [1])
                    .actor("b", [1])
                    .edge("a", "b")
                    .edge("a", "b"),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateEdge { .. }));
    }

    #[test]
    fn cycles_are_rejected() {
        let err = McSystem::builder(1, 1)
            .graph(
                DagBuilder::new(0, 9)
                    .actor("a", [1])
                    .actor("b", [1])
                    .actor("c", [1])
                    .edge("a", "b")
                    .edge("b", "c")
                    .edge("c", "a"),
            )
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::Cyclic { graph: 0 });
    }
}
