//! Real interval arithmetic with outward rounding.
//!
//! Every operation returns an interval containing the exact result for all
//! choices of operands inside the input intervals (the enclosure property).
//! IEEE 754 basic operations are correctly rounded, so widening the rounded
//! endpoint by one ulp is enough; libm `ln`/`atan2` are only faithfully
//! rounded, so their endpoints get two ulps.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};
use thiserror::Error;

/// Errors raised by partial interval operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntervalError {
    /// Division or reciprocal where the divisor interval contains zero.
    #[error("division by an interval containing zero")]
    DivisionByZeroInterval,
    /// Logarithm of an interval that touches the non-positive axis.
    #[error("logarithm of an interval touching zero or negative values")]
    LogNonPositive,
    /// Complex argument of a box that meets the origin or straddles the
    /// negative real axis, where the principal argument jumps by 2π.
    #[error("argument of a box meeting the origin or the branch cut")]
    ArgumentBranchCut,
}

fn prev(x: f64) -> f64 {
    x.next_down()
}

fn next(x: f64) -> f64 {
    x.next_up()
}

fn prev2(x: f64) -> f64 {
    x.next_down().next_down()
}

fn next2(x: f64) -> f64 {
    x.next_up().next_up()
}

/// A closed interval [lo, hi]; invariant `lo <= hi`, both finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        debug_assert!(lo <= hi, "interval bounds out of order: [{lo}, {hi}]");
        Self { lo, hi }
    }

    /// The degenerate interval [v, v].
    pub fn point(v: f64) -> Self {
        Self { lo: v, hi: v }
    }

    /// The interval [mid - rad, mid + rad], widened outward one ulp.
    pub fn with_radius(mid: f64, rad: f64) -> Self {
        debug_assert!(rad >= 0.0);
        Self {
            lo: prev(mid - rad),
            hi: next(mid + rad),
        }
    }

    /// An enclosure of π. `f64::consts::PI` underestimates π by less than
    /// one ulp, so a one-ulp widening on both sides suffices.
    pub fn pi() -> Self {
        Self {
            lo: prev(std::f64::consts::PI),
            hi: next(std::f64::consts::PI),
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.lo <= v && v <= self.hi
    }

    pub fn contains_zero(&self) -> bool {
        self.lo <= 0.0 && 0.0 <= self.hi
    }

    /// True if every point of the interval is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.lo > 0.0
    }

    /// True if `self` lies in the interior of `other`.
    pub fn strictly_inside(&self, other: &Interval) -> bool {
        other.lo < self.lo && self.hi < other.hi
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }

    pub fn mid(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    pub fn rad(&self) -> f64 {
        0.5 * (self.hi - self.lo)
    }

    /// Largest absolute value over the interval.
    pub fn mag(&self) -> f64 {
        self.lo.abs().max(self.hi.abs())
    }

    pub fn hull(&self, other: &Interval) -> Interval {
        Interval::new(self.lo.min(other.lo), self.hi.max(other.hi))
    }

    /// Tight square: [0, max²] when the interval straddles zero.
    pub fn sqr(&self) -> Interval {
        if self.lo >= 0.0 {
            Interval::new(prev(self.lo * self.lo), next(self.hi * self.hi))
        } else if self.hi <= 0.0 {
            Interval::new(prev(self.hi * self.hi), next(self.lo * self.lo))
        } else {
            let m = self.mag();
            Interval::new(0.0, next(m * m))
        }
    }

    /// Reciprocal; the interval must not contain zero.
    pub fn recip(&self) -> Result<Interval, IntervalError> {
        if self.contains_zero() {
            return Err(IntervalError::DivisionByZeroInterval);
        }
        Ok(Interval::new(prev(1.0 / self.hi), next(1.0 / self.lo)))
    }

    /// Division; the divisor must not contain zero.
    pub fn div(&self, rhs: &Interval) -> Result<Interval, IntervalError> {
        if rhs.contains_zero() {
            return Err(IntervalError::DivisionByZeroInterval);
        }
        let q = [
            self.lo / rhs.lo,
            self.lo / rhs.hi,
            self.hi / rhs.lo,
            self.hi / rhs.hi,
        ];
        let lo = q.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = q.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Ok(Interval::new(prev(lo), next(hi)))
    }

    /// Natural logarithm; the interval must be strictly positive.
    pub fn ln(&self) -> Result<Interval, IntervalError> {
        if self.lo <= 0.0 {
            return Err(IntervalError::LogNonPositive);
        }
        Ok(Interval::new(prev2(self.lo.ln()), next2(self.hi.ln())))
    }

    /// Interval atan2 over the box `y × x`.
    ///
    /// atan2 has no interior critical points and is monotone along every
    /// horizontal and vertical edge, so on any box avoiding the origin and
    /// the branch cut its range is attained at the corners. Boxes meeting
    /// the origin, or holding points on both sides of the cut, are rejected.
    pub fn atan2(y: Interval, x: Interval) -> Result<Interval, IntervalError> {
        if x.contains_zero() && y.contains_zero() {
            return Err(IntervalError::ArgumentBranchCut);
        }
        if x.lo < 0.0 && y.lo < 0.0 && y.hi >= 0.0 {
            return Err(IntervalError::ArgumentBranchCut);
        }
        let c = [
            y.lo.atan2(x.lo),
            y.lo.atan2(x.hi),
            y.hi.atan2(x.lo),
            y.hi.atan2(x.hi),
        ];
        let lo = c.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = c.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Ok(Interval::new(prev2(lo), next2(hi)))
    }
}

impl Add for Interval {
    type Output = Interval;
    fn add(self, rhs: Interval) -> Interval {
        Interval::new(prev(self.lo + rhs.lo), next(self.hi + rhs.hi))
    }
}

impl Sub for Interval {
    type Output = Interval;
    fn sub(self, rhs: Interval) -> Interval {
        Interval::new(prev(self.lo - rhs.hi), next(self.hi - rhs.lo))
    }
}

impl Mul for Interval {
    type Output = Interval;
    fn mul(self, rhs: Interval) -> Interval {
        let p = [
            self.lo * rhs.lo,
            self.lo * rhs.hi,
            self.hi * rhs.lo,
            self.hi * rhs.hi,
        ];
        let lo = p.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = p.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Interval::new(prev(lo), next(hi))
    }
}

impl Neg for Interval {
    type Output = Interval;
    fn neg(self) -> Interval {
        // Negation is exact; no widening.
        Interval::new(-self.hi, -self.lo)
    }
}
