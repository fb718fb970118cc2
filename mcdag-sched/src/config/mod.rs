/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! System description loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! cores: 2
//! levels: 2
//! algorithm: hybrid          # optional, default least_laxity
//! hyperperiod_limit: 100000  # optional, slots
//! graphs:
//!   - id: 0
//!     period: 4
//!     actors:
//!       - { name: A, wcet: [1, 2] }
//!       - { name: B, wcet: [2, 0], fault_tolerance: false }
//!     edges:
//!       - [A, B]
//! ```
//!
//! Parsing only checks the YAML shape.  Every model invariant (acyclic
//! graphs, WCET vector lengths, unique names …) is enforced by
//! [`SystemConfig::into_system`], which goes through the model builder.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::hyperperiod::DEFAULT_HYPERPERIOD_LIMIT;
use crate::model::{DagBuilder, McSystem, ModelError, Slot};
use crate::scheduler::Algorithm;

// ── YAML deserialization types ────────────────────────────────────────────────

/// Top-level system description as it appears in the YAML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    pub cores: usize,
    pub levels: usize,
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Upper bound on the hyperperiod, in slots.
    #[serde(default = "default_hyperperiod_limit")]
    pub hyperperiod_limit: Slot,
    pub graphs: Vec<GraphConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    pub id: u32,
    pub period: Slot,
    pub actors: Vec<ActorConfig>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActorConfig {
    pub name: String,
    /// One budget per level, LO first.
    pub wcet: Vec<Slot>,
    #[serde(default)]
    pub fault_tolerance: bool,
}

/// Serde default for `hyperperiod_limit`.
fn default_hyperperiod_limit() -> Slot {
    DEFAULT_HYPERPERIOD_LIMIT
}

impl SystemConfig {
    /// Parse the YAML file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or if the YAML does not
    /// match the expected structure.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading system description from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open system description: {}", path.display()))?;

        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        info!(
            cores = config.cores,
            levels = config.levels,
            graphs = config.graphs.len(),
            algorithm = %config.algorithm,
            "Loaded system description"
        );
        Ok(config)
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: SystemConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Build the [`McSystem`] described by this configuration.
    ///
    /// # Errors
    /// Any [`ModelError`] raised by the model builder.
    pub fn into_system(self) -> Result<McSystem, ModelError> {
        let mut builder = McSystem::builder(self.cores, self.levels);
        for graph in self.graphs {
            debug!(
                graph = graph.id,
                period = graph.period,
                actors = graph.actors.len(),
                edges = graph.edges.len(),
                "  graph"
            );
            let mut dag = DagBuilder::new(graph.id, graph.period);
            for actor in graph.actors {
                dag = dag.actor_with(actor.name, actor.wcet, actor.fault_tolerance);
            }
            for (src, dst) in graph.edges {
                dag = dag.edge(src, dst);
            }
            builder = builder.graph(dag);
        }
        builder.build()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const CHAIN: &str = r#"
cores: 1
levels: 2
algorithm: hybrid
graphs:
  - id: 0
    period: 4
    actors:
      - { name: A, wcet: [1, 2], fault_tolerance: true }
      - { name: B, wcet: [2, 0] }
    edges:
      - [A, B]
"#;

    // ── load_from_file ────────────────────────────────────────────────────────

    #[test]
    fn load_chain_yaml() {
        let f = yaml_tempfile(CHAIN);
        let config = SystemConfig::load_from_file(f.path()).unwrap();

        assert_eq!(config.cores, 1);
        assert_eq!(config.levels, 2);
        assert_eq!(config.algorithm, Algorithm::Hybrid);
        assert_eq!(config.hyperperiod_limit, DEFAULT_HYPERPERIOD_LIMIT);
        assert_eq!(config.graphs[0].edges, [("A".to_string(), "B".to_string())]);
        assert!(config.graphs[0].actors[0].fault_tolerance);
        assert!(!config.graphs[0].actors[1].fault_tolerance);
    }

    #[test]
    fn optional_fields_use_defaults_when_absent() {
        let yaml = r#"
cores: 2
levels: 1
graphs:
  - id: 3
    period: 5
    actors:
      - { name: solo, wcet: [1] }
"#;
        let config = SystemConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.algorithm, Algorithm::LeastLaxity);
        assert!(config.graphs[0].edges.is_empty());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = SystemConfig::load_from_file(Path::new("/nonexistent/path/system.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(SystemConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn unknown_algorithm_is_rejected_at_parse_time() {
        let yaml = CHAIN.replace("algorithm: hybrid", "algorithm: round_robin");
        assert!(SystemConfig::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let yaml = CHAIN.replace("levels: 2", "levels: 2\nnodes: 3");
        assert!(SystemConfig::from_yaml_str(&yaml).is_err());
    }

    // ── into_system ───────────────────────────────────────────────────────────

    #[test]
    fn into_system_builds_the_model() {
        let system = SystemConfig::from_yaml_str(CHAIN)
            .unwrap()
            .into_system()
            .unwrap();
        assert_eq!(system.cores(), 1);
        assert_eq!(system.actor_count(), 2);
        let a = system.actor(system.key_of("A").unwrap());
        assert_eq!(a.wcets(), [1, 2]);
        assert!(a.fault_tolerance);
        assert_eq!(system.graph(0).successors(a.id), [1]);
    }

    #[test]
    fn model_errors_surface_from_into_system() {
        let yaml = CHAIN.replace("[A, B]", "[A, C]");
        let err = SystemConfig::from_yaml_str(&yaml)
            .unwrap()
            .into_system()
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownActor { .. }));
    }
}
