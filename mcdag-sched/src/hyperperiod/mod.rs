/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Hyperperiod of a graph set.
//!
//! The hyperperiod is the LCM of all graph periods: the length of every
//! scheduling table and the window after which the whole system repeats.
//!
//! Each failure has its own [`HyperperiodError`] variant so the caller can
//! tell "nothing to schedule" from "arithmetic overflow" from "table would be
//! unreasonably large".

pub mod math;

use tracing::{debug, info, warn};

use crate::model::{Dag, Slot};
use math::lcm_all;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Default upper limit on the hyperperiod, in slots.
///
/// The limit bounds the length of every table and therefore build time.
/// The total cell count also grows with cores and levels; it is checked
/// separately when the table is allocated.  Use
/// [`HyperperiodCalculator::with_limit`] to change it.
pub const DEFAULT_HYPERPERIOD_LIMIT: Slot = 1_000_000;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur during hyperperiod calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HyperperiodError {
    /// No graph with a non-zero period was supplied.
    NoValidPeriods,

    /// LCM calculation overflowed.  Carries the offending operands.
    Overflow { a: Slot, b: Slot },

    /// The hyperperiod exceeds the configured limit.
    TooLarge { value: Slot, limit: Slot },
}

impl std::fmt::Display for HyperperiodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HyperperiodError::NoValidPeriods => {
                write!(f, "no graph with a valid (non-zero) period")
            }
            HyperperiodError::Overflow { a, b } => {
                write!(f, "LCM overflow computing lcm({a}, {b})")
            }
            HyperperiodError::TooLarge { value, limit } => {
                write!(f, "hyperperiod of {value} slots exceeds limit of {limit} slots")
            }
        }
    }
}

impl std::error::Error for HyperperiodError {}

// ── HyperperiodInfo ───────────────────────────────────────────────────────────

/// Calculated hyperperiod of one system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperperiodInfo {
    /// LCM of all graph periods, in slots.
    pub hyperperiod: Slot,

    /// Distinct graph periods (sorted, deduplicated).
    pub unique_periods: Vec<Slot>,

    /// Number of graphs that contributed.
    pub graph_count: usize,
}

// ── HyperperiodCalculator ─────────────────────────────────────────────────────

/// Computes the hyperperiod of a graph set, bounded by a slot limit.
///
/// # Example
/// ```rust
/// use mcdag_sched::hyperperiod::HyperperiodCalculator;
/// use mcdag_sched::model::{DagBuilder, McSystem};
///
/// let system = McSystem::builder(1, 1)
///     .graph(DagBuilder::new(0, 4).actor("a", [1]))
///     .graph(DagBuilder::new(1, 6).actor("b", [1]))
///     .build()
///     .unwrap();
///
/// let info = HyperperiodCalculator::new().calculate(system.graphs()).unwrap();
/// assert_eq!(info.hyperperiod, 12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HyperperiodCalculator {
    limit: Slot,
}

impl HyperperiodCalculator {
    /// Calculator with [`DEFAULT_HYPERPERIOD_LIMIT`].
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_HYPERPERIOD_LIMIT,
        }
    }

    /// Calculator with a custom limit, in slots.
    pub fn with_limit(limit: Slot) -> Self {
        Self { limit }
    }

    /// Hyperperiod of `graphs`.
    ///
    /// # Errors
    /// * [`HyperperiodError::NoValidPeriods`] – empty slice or only zero
    ///   periods.
    /// * [`HyperperiodError::Overflow`] – LCM exceeded `Slot`.
    /// * [`HyperperiodError::TooLarge`] – result above the limit.
    pub fn calculate(&self, graphs: &[Dag]) -> Result<HyperperiodInfo, HyperperiodError> {
        let mut unique_periods: Vec<Slot> = graphs
            .iter()
            .map(Dag::period)
            .filter(|&p| p > 0)
            .collect();

        if unique_periods.is_empty() {
            warn!("No graph with a valid period");
            return Err(HyperperiodError::NoValidPeriods);
        }
        let graph_count = unique_periods.len();
        unique_periods.sort_unstable();
        unique_periods.dedup();

        let hyperperiod = lcm_all(unique_periods.iter().copied())?;

        if hyperperiod > self.limit {
            warn!(hyperperiod, limit = self.limit, "Hyperperiod exceeds configured limit");
            return Err(HyperperiodError::TooLarge {
                value: hyperperiod,
                limit: self.limit,
            });
        }

        info!(
            hyperperiod,
            graph_count,
            unique_count = unique_periods.len(),
            "Calculated hyperperiod"
        );
        for p in &unique_periods {
            debug!(period = p, instances = hyperperiod / p, "  unique period");
        }

        Ok(HyperperiodInfo {
            hyperperiod,
            unique_periods,
            graph_count,
        })
    }
}

impl Default for HyperperiodCalculator {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
