/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pure arithmetic helpers: GCD and checked LCM over slot counts.
//!
//! Free functions so they can be tested independently of
//! [`HyperperiodCalculator`](super::HyperperiodCalculator).

use super::HyperperiodError;
use crate::model::Slot;

/// Iterative Euclidean GCD.  `gcd(0, x) == x`.
pub fn gcd(mut a: Slot, mut b: Slot) -> Slot {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Checked LCM.
///
/// Computed as `(a / gcd(a, b)) * b` so the intermediate value never exceeds
/// the result; the final multiplication is still checked.  Returns `Ok(0)`
/// when either input is `0`.
pub fn lcm(a: Slot, b: Slot) -> Result<Slot, HyperperiodError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    (a / gcd(a, b))
        .checked_mul(b)
        .ok_or(HyperperiodError::Overflow { a, b })
}

/// LCM of every period yielded by `periods`.
///
/// Returns `Ok(0)` for an empty iterator and stops at the first overflow.
pub fn lcm_all<I>(periods: I) -> Result<Slot, HyperperiodError>
where
    I: IntoIterator<Item = Slot>,
{
    let mut iter = periods.into_iter();
    let Some(first) = iter.next() else {
        return Ok(0);
    };
    iter.try_fold(first, lcm)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
