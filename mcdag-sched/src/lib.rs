/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! mcdag-sched – static scheduling tables for mixed-criticality DAGs
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── model          – actors, graphs, systems and their invariants
//! ├── hyperperiod/   – LCM / GCD helpers, bounded hyperperiod
//! ├── scheduler/     – table builder
//! │   ├── deadline   – local deadline propagation per level
//! │   ├── ready      – ready list and remaining time
//! │   ├── priority   – least-laxity and hybrid policies
//! │   ├── table      – multi-level scheduling table
//! │   ├── feasibility – demand / capacity pre-check
//! │   └── error      – SchedulerError, InfeasibilityReason
//! ├── analytics      – preemption and dispatch counters
//! ├── config/        – YAML system description
//! └── report         – serializable schedule report
//! ```

pub mod analytics;
pub mod config;
pub mod hyperperiod;
pub mod model;
pub mod report;
pub mod scheduler;
