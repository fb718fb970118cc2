/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the table builder.
//!
//! Two error enums model the two failure layers:
//!
//! * [`InfeasibilityReason`]: why the builder gave up at a given level and
//!   slot (low-level, carries the offending actors and values).
//! * [`SchedulerError`]: top-level failure returned from
//!   [`McScheduler::build()`](super::McScheduler::build).
//!
//! Every variant carries enough structured data to emit a fully-qualified
//! `tracing` event without re-parsing the message.

use thiserror::Error;

use crate::hyperperiod::HyperperiodError;
use crate::model::{Level, ModelError, Slot};

// ── Infeasibility ─────────────────────────────────────────────────────────────

/// Detailed reason why a level could not be built.
///
/// Carried inside [`SchedulerError::Infeasible`] so the caller always knows
/// *where* the build stopped and *why*.
#[derive(Debug, Clone, PartialEq)]
pub enum InfeasibilityReason {
    /// An actor's weight went negative: it can no longer meet its local
    /// deadline.
    NegativeWeight { actor: String, weight: i64 },

    /// More zero-weight actors than cores in a single slot.
    TooManyUrgent { urgent: usize, cores: usize },

    /// Actors still owed execution when their instance (or the level) ended.
    UnfinishedWork { actors: Vec<String> },

    /// The level's total demand over the hyperperiod exceeds
    /// `cores × hyperperiod`.
    DemandExceedsCapacity { demand: Slot, capacity: Slot },
}

impl std::fmt::Display for InfeasibilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibilityReason::NegativeWeight { actor, weight } => write!(
                f,
                "actor '{}' has negative weight {} and will miss its deadline",
                actor, weight
            ),

            InfeasibilityReason::TooManyUrgent { urgent, cores } => write!(
                f,
                "{} actors must run in this slot but only {} cores are available",
                urgent, cores
            ),

            InfeasibilityReason::UnfinishedWork { actors } => {
                write!(f, "unfinished work for [{}]", actors.join(", "))
            }

            InfeasibilityReason::DemandExceedsCapacity { demand, capacity } => write!(
                f,
                "demand of {} slots exceeds capacity of {} slots",
                demand, capacity
            ),
        }
    }
}

// ── Top-level scheduler errors ────────────────────────────────────────────────

/// Top-level error type returned by
/// [`McScheduler::build()`](super::McScheduler::build).
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The system violates a model invariant.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The hyperperiod could not be computed.
    #[error("hyperperiod: {0}")]
    Hyperperiod(#[from] HyperperiodError),

    /// The algorithm name is not recognised.
    #[error("unknown scheduling algorithm: '{0}' (valid: least_laxity, hybrid)")]
    UnknownAlgorithm(String),

    /// No valid table exists for `level` under the chosen policy.
    ///
    /// `slot` is the absolute slot at which the builder stopped.
    #[error("level {level} infeasible at slot {slot}: {reason}")]
    Infeasible {
        level: Level,
        slot: Slot,
        reason: InfeasibilityReason,
    },

    /// The table for `levels × hyperperiod × cores` cannot be allocated.
    #[error(
        "scheduling table of {levels} levels x {hyperperiod} slots x {cores} cores is too large"
    )]
    TableTooLarge {
        levels: usize,
        hyperperiod: Slot,
        cores: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_message_names_level_slot_and_reason() {
        let err = SchedulerError::Infeasible {
            level: 1,
            slot: 3,
            reason: InfeasibilityReason::TooManyUrgent {
                urgent: 3,
                cores: 2,
            },
        };
        assert_eq!(
            err.to_string(),
            "level 1 infeasible at slot 3: 3 actors must run in this slot but only 2 cores are available"
        );
    }

    #[test]
    fn unfinished_work_lists_actors() {
        let reason = InfeasibilityReason::UnfinishedWork {
            actors: vec!["A".into(), "B".into()],
        };
        assert_eq!(reason.to_string(), "unfinished work for [A, B]");
    }

    #[test]
    fn model_errors_convert() {
        let err: SchedulerError = ModelError::NoCores.into();
        assert!(matches!(err, SchedulerError::Model(ModelError::NoCores)));
    }
}
