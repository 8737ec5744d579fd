//! Interval Krawczyk test for the selected gluing equations.
//!
//! The residual map is the rectangular form of the equations,
//! `F_r(z) = ∏ᵢ zᵢ^{Aᵢ}(1-zᵢ)^{Bᵢ} - sign_r`, a holomorphic map with no
//! branch cuts. The test works in 2N real coordinates (real and imaginary
//! part per tetrahedron); a complex Jacobian entry `d` acts on those
//! coordinates as the 2×2 block [[Re d, -Im d], [Im d, Re d]].
//!
//! The preconditioner `Y`, an approximate inverse of the Jacobian at the
//! floating approximation, is computed in ordinary f64 arithmetic. It is
//! only a heuristic: soundness rests entirely on the interval evaluation of
//! `K(X) = x₀ - Y·F(x₀) + (I - Y·J(X))·(X - x₀)` and the strict-interior
//! containment K(X) ⊂ int X, which by the Brouwer fixed-point argument
//! proves a unique root of the selected system inside X.

use crate::complex::IntervalComplex;
use crate::equations::{GluingEquations, GluingRow};
use crate::interval::{Interval, IntervalError};
use crate::CuspError;
use nalgebra::DMatrix;
use num_complex::Complex64;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Multiple of ‖Y·F(x₀)‖∞ used as the initial box radius.
const BOX_INFLATION: f64 = 64.0;
/// Absolute radius floor, so an already-exact approximation still gets a
/// box with room for the contraction image.
const BOX_MIN_RADIUS: f64 = 1e-12;

/// An interval vector guaranteed to contain exactly one solution of the
/// selected equation subsystem: one complex box per tetrahedron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertifiedBox {
    shapes: Vec<IntervalComplex>,
}

impl CertifiedBox {
    pub(crate) fn new(shapes: Vec<IntervalComplex>) -> Self {
        Self { shapes }
    }

    pub fn shapes(&self) -> &[IntervalComplex] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Runs the Krawczyk containment test around `approx` for the rows in
/// `selected`. Returns the certified enclosure on success, `None` when the
/// test does not certify (no widening or bisection is attempted), and an
/// error only for inconsistent input data.
pub fn krawczyk_certify(
    equations: &GluingEquations,
    selected: &[usize],
    approx: &[Complex64],
) -> Result<Option<CertifiedBox>, CuspError> {
    let n = equations.tetrahedra();
    if selected.len() != n || approx.len() != n {
        return Err(CuspError::DimensionMismatch(format!(
            "Krawczyk test needs {} rows and {} shapes, got {} and {}",
            n,
            n,
            selected.len(),
            approx.len()
        )));
    }
    let rows: Vec<&GluingRow> = selected.iter().map(|&i| equations.row(i)).collect();
    let dim = 2 * n;

    // Interval residual at the approximation itself (point boxes).
    let points: Vec<IntervalComplex> = approx.iter().map(|&z| IntervalComplex::point(z)).collect();
    let f0 = flatten_residuals(&rows, &points)?;

    // Approximate inverse Jacobian in plain floating arithmetic. A singular
    // matrix here just means the test cannot run.
    let jacobian = float_jacobian(&rows, approx);
    let y = match jacobian.try_inverse() {
        Some(inv) => inv,
        None => return Ok(None),
    };

    // Newton correction Y·F(x₀), interval-evaluated against the float Y.
    let yf: Vec<Interval> = (0..dim)
        .map(|i| {
            let mut acc = Interval::point(0.0);
            for k in 0..dim {
                acc = acc + Interval::point(y[(i, k)]) * f0[k];
            }
            acc
        })
        .collect();

    // Initial candidate box around x₀.
    let radius = BOX_INFLATION * yf.iter().map(Interval::mag).fold(0.0, f64::max) + BOX_MIN_RADIUS;
    let x0: Vec<f64> = approx.iter().flat_map(|z| [z.re, z.im]).collect();
    let x: Vec<Interval> = x0.iter().map(|&v| Interval::with_radius(v, radius)).collect();
    let boxes: Vec<IntervalComplex> = (0..n)
        .map(|i| IntervalComplex::new(x[2 * i], x[2 * i + 1]))
        .collect();

    // Interval Jacobian over the whole box. A box wide enough to reach the
    // singularities at z = 0 or z = 1 cannot pass the containment test, so
    // an interval-arithmetic domain failure here is a test failure, not a
    // data error.
    let jx = match interval_jacobian(&rows, &boxes) {
        Ok(jx) => jx,
        Err(_) => return Ok(None),
    };

    // K(X) = x₀ - Y·F(x₀) + (I - Y·J(X))·(X - x₀), componentwise.
    let delta: Vec<Interval> = (0..dim).map(|i| x[i] - Interval::point(x0[i])).collect();
    let mut k = Vec::with_capacity(dim);
    for i in 0..dim {
        let mut acc = Interval::point(x0[i]) - yf[i];
        for j in 0..dim {
            let mut yj = Interval::point(0.0);
            for l in 0..dim {
                yj = yj + Interval::point(y[(i, l)]) * jx[l][j];
            }
            let residual_entry = if i == j {
                Interval::point(1.0) - yj
            } else {
                -yj
            };
            acc = acc + residual_entry * delta[j];
        }
        k.push(acc);
    }

    if !k.iter().zip(x.iter()).all(|(ki, xi)| ki.strictly_inside(xi)) {
        return Ok(None);
    }

    let shapes = (0..n)
        .map(|i| IntervalComplex::new(k[2 * i], k[2 * i + 1]))
        .collect();
    Ok(Some(CertifiedBox::new(shapes)))
}

/// ∏ᵢ zᵢ^{Aᵢ}(1-zᵢ)^{Bᵢ} over interval boxes.
fn rect_product(
    row: &GluingRow,
    shapes: &[IntervalComplex],
) -> Result<IntervalComplex, IntervalError> {
    let one = IntervalComplex::one();
    let mut product = one;
    for (i, z) in shapes.iter().enumerate() {
        let a = row.rect_z[i];
        let b = row.rect_one_minus_z[i];
        if a != 0 {
            product = product * z.powi(a)?;
        }
        if b != 0 {
            product = product * (one - *z).powi(b)?;
        }
    }
    Ok(product)
}

/// Residuals of every selected row, flattened to 2N real intervals.
fn flatten_residuals(
    rows: &[&GluingRow],
    shapes: &[IntervalComplex],
) -> Result<Vec<Interval>, CuspError> {
    let mut out = Vec::with_capacity(2 * rows.len());
    for row in rows {
        let sign = IntervalComplex::point(Complex64::new(row.rect_sign as f64, 0.0));
        let f = rect_product(row, shapes)? - sign;
        out.push(f.re);
        out.push(f.im);
    }
    Ok(out)
}

/// Plain-f64 Jacobian of the rectangular residuals at the approximation,
/// expanded to 2N×2N real form.
fn float_jacobian(rows: &[&GluingRow], approx: &[Complex64]) -> DMatrix<f64> {
    let n = approx.len();
    let mut m = DMatrix::zeros(2 * n, 2 * n);
    for (r, row) in rows.iter().enumerate() {
        let product: Complex64 = approx
            .iter()
            .enumerate()
            .map(|(i, &z)| z.powi(row.rect_z[i] as i32) * (1.0 - z).powi(row.rect_one_minus_z[i] as i32))
            .product();
        for (i, &z) in approx.iter().enumerate() {
            let a = row.rect_z[i] as f64;
            let b = row.rect_one_minus_z[i] as f64;
            let d = (a / z - b / (1.0 - z)) * product;
            m[(2 * r, 2 * i)] = d.re;
            m[(2 * r, 2 * i + 1)] = -d.im;
            m[(2 * r + 1, 2 * i)] = d.im;
            m[(2 * r + 1, 2 * i + 1)] = d.re;
        }
    }
    m
}

/// Interval Jacobian over the candidate box, in 2N×2N real form.
fn interval_jacobian(
    rows: &[&GluingRow],
    boxes: &[IntervalComplex],
) -> Result<Vec<Vec<Interval>>, IntervalError> {
    let n = boxes.len();
    let one = IntervalComplex::one();
    let mut m = vec![vec![Interval::point(0.0); 2 * n]; 2 * n];
    for (r, row) in rows.iter().enumerate() {
        let product = rect_product(row, boxes)?;
        for (i, z) in boxes.iter().enumerate() {
            let a = row.rect_z[i];
            let b = row.rect_one_minus_z[i];
            let mut d = IntervalComplex::point(Complex64::zero());
            if a != 0 {
                d = d + z.recip()?.scale(a as f64);
            }
            if b != 0 {
                d = d - (one - *z).recip()?.scale(b as f64);
            }
            let d = d * product;
            m[2 * r][2 * i] = d.re;
            m[2 * r][2 * i + 1] = -d.im;
            m[2 * r + 1][2 * i] = d.im;
            m[2 * r + 1][2 * i + 1] = d.re;
        }
    }
    Ok(m)
}
