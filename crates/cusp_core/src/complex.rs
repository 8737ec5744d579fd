//! Rectangular complex intervals: a pair of real intervals enclosing the
//! real and imaginary parts. Products of boxes overestimate the true image
//! set, but every operation preserves the enclosure property, which is all
//! the certification argument needs.

use crate::interval::{Interval, IntervalError};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A rectangular enclosure of a complex number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalComplex {
    pub re: Interval,
    pub im: Interval,
}

impl IntervalComplex {
    pub fn new(re: Interval, im: Interval) -> Self {
        Self { re, im }
    }

    /// The degenerate box holding exactly `z`.
    pub fn point(z: Complex64) -> Self {
        Self {
            re: Interval::point(z.re),
            im: Interval::point(z.im),
        }
    }

    pub fn one() -> Self {
        Self::point(Complex64::new(1.0, 0.0))
    }

    pub fn contains(&self, z: Complex64) -> bool {
        self.re.contains(z.re) && self.im.contains(z.im)
    }

    pub fn strictly_inside(&self, other: &IntervalComplex) -> bool {
        self.re.strictly_inside(&other.re) && self.im.strictly_inside(&other.im)
    }

    pub fn mid(&self) -> Complex64 {
        Complex64::new(self.re.mid(), self.im.mid())
    }

    /// Interval enclosure of |z|².
    pub fn norm_sqr(&self) -> Interval {
        self.re.sqr() + self.im.sqr()
    }

    /// Reciprocal via z̄ / |z|²; the box must exclude zero.
    pub fn recip(&self) -> Result<IntervalComplex, IntervalError> {
        let d = self.norm_sqr();
        if d.contains_zero() {
            return Err(IntervalError::DivisionByZeroInterval);
        }
        Ok(IntervalComplex {
            re: self.re.div(&d)?,
            im: (-self.im).div(&d)?,
        })
    }

    pub fn div(&self, rhs: &IntervalComplex) -> Result<IntervalComplex, IntervalError> {
        Ok(*self * rhs.recip()?)
    }

    /// Scales both parts by an exact floating constant.
    pub fn scale(&self, k: f64) -> IntervalComplex {
        let k = Interval::point(k);
        IntervalComplex {
            re: k * self.re,
            im: k * self.im,
        }
    }

    /// Integer power by repeated squaring; negative exponents go through
    /// the reciprocal and require the box to exclude zero.
    pub fn powi(&self, n: i64) -> Result<IntervalComplex, IntervalError> {
        if n < 0 {
            return self.powi(-n)?.recip();
        }
        let mut result = IntervalComplex::one();
        let mut base = *self;
        let mut e = n as u64;
        while e > 0 {
            if e & 1 == 1 {
                result = result * base;
            }
            base = base * base;
            e >>= 1;
        }
        Ok(result)
    }

    /// Principal argument of the box.
    pub fn arg(&self) -> Result<Interval, IntervalError> {
        Interval::atan2(self.im, self.re)
    }

    /// Principal logarithm: re = ½·ln|z|², im = arg z.
    pub fn ln(&self) -> Result<IntervalComplex, IntervalError> {
        let half = Interval::point(0.5);
        Ok(IntervalComplex {
            re: half * self.norm_sqr().ln()?,
            im: self.arg()?,
        })
    }
}

impl Add for IntervalComplex {
    type Output = IntervalComplex;
    fn add(self, rhs: IntervalComplex) -> IntervalComplex {
        IntervalComplex {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl Sub for IntervalComplex {
    type Output = IntervalComplex;
    fn sub(self, rhs: IntervalComplex) -> IntervalComplex {
        IntervalComplex {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}

impl Mul for IntervalComplex {
    type Output = IntervalComplex;
    fn mul(self, rhs: IntervalComplex) -> IntervalComplex {
        IntervalComplex {
            re: self.re * rhs.re - self.im * rhs.im,
            im: self.re * rhs.im + self.im * rhs.re,
        }
    }
}

impl Neg for IntervalComplex {
    type Output = IntervalComplex;
    fn neg(self) -> IntervalComplex {
        IntervalComplex {
            re: -self.re,
            im: -self.im,
        }
    }
}
