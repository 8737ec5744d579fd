//! Top-level verification of an approximate hyperbolic structure.
//!
//! `verify_hyperbolicity` is a pure function of the gluing data and the
//! floating approximation: precondition checks, row selection, Krawczyk
//! certification and geometric validation run once, in that order, with
//! no retries. Expected negative outcomes (the approximation is too
//! degenerate, the containment test fails, the certified root is the
//! wrong branch) are reported through `FailureReason`; only inconsistent
//! input data is an `Err`.

use crate::equations::{select_rows, GluingEquations};
use crate::geometry::{
    first_holonomy_failure, first_orientation_failure, holonomy_sums, RowHolonomy,
};
use crate::krawczyk::{krawczyk_certify, CertifiedBox};
use crate::CuspError;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Smallest acceptable imaginary part among the approximate shapes.
/// Near-degenerate tetrahedra make the Jacobian ill-conditioned, so the
/// certification is not attempted below this threshold.
pub const MIN_IMAGINARY_PART: f64 = 1e-6;

/// Width used to classify a shape as flat or degenerate.
const CLASSIFY_TOLERANCE: f64 = 1e-9;

/// Why a verification call did not accept the approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// A tetrahedron shape is too close to degenerate to attempt the test.
    NotEnoughImaginaryPart,
    /// The Krawczyk containment did not hold at the initial box (or its
    /// preconditioner could not be computed). No root was certified.
    KrawczykTestFailed,
    /// A root was certified, but the box is not positively oriented
    /// throughout.
    NegativelyOriented { tetrahedron: usize },
    /// A root was certified, but an argument sum misses its target: the
    /// root does not carry the intended completion or filling.
    HolonomyMismatch { row: usize },
}

/// Outcome of one verification call. `certified_shapes` is present
/// whenever the Krawczyk test succeeded, even if the geometric checks
/// then rejected the root: the enclosure itself remains valid, and
/// callers can tell "no nearby root" from "a root exists but is the
/// wrong one".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    pub certified_shapes: Option<CertifiedBox>,
    pub failure: Option<FailureReason>,
    /// Argument-sum diagnostics for the selected rows, when computed.
    pub holonomy: Vec<RowHolonomy>,
}

impl VerificationResult {
    fn rejected(reason: FailureReason) -> Self {
        Self {
            verified: false,
            certified_shapes: None,
            failure: Some(reason),
            holonomy: Vec::new(),
        }
    }
}

/// Uncertified classification of an approximate solution, mirroring the
/// solution types the surrounding triangulation layer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeQuality {
    /// All tetrahedra positively oriented.
    Geometric,
    /// Mixed orientations.
    NonGeometric,
    /// All tetrahedra flat.
    Flat,
    /// Some shape is 0, 1, or not finite.
    Degenerate,
}

/// Smallest imaginary part among the shapes; non-finite values count as
/// negative infinity.
pub fn min_imaginary_shape(shapes: &[Complex64]) -> f64 {
    shapes.iter().fold(f64::INFINITY, |acc, z| {
        if z.im.is_nan() {
            f64::NEG_INFINITY
        } else {
            acc.min(z.im)
        }
    })
}

/// Classifies an uncertified shape vector.
pub fn classify_shapes(shapes: &[Complex64]) -> ShapeQuality {
    let degenerate = |z: &Complex64| {
        !z.is_finite()
            || z.norm_sqr() < CLASSIFY_TOLERANCE * CLASSIFY_TOLERANCE
            || (*z - 1.0).norm_sqr() < CLASSIFY_TOLERANCE * CLASSIFY_TOLERANCE
    };
    if shapes.iter().any(degenerate) {
        ShapeQuality::Degenerate
    } else if shapes.iter().all(|z| z.im.abs() <= CLASSIFY_TOLERANCE) {
        ShapeQuality::Flat
    } else if shapes.iter().all(|z| z.im > 0.0) {
        ShapeQuality::Geometric
    } else {
        ShapeQuality::NonGeometric
    }
}

/// Certifies that a true solution of the gluing equations exists near
/// `approx`, is positively oriented, and carries the intended completion
/// and filling data.
pub fn verify_hyperbolicity(
    equations: &GluingEquations,
    approx: &[Complex64],
) -> Result<VerificationResult, CuspError> {
    if approx.len() != equations.tetrahedra() {
        return Err(CuspError::DimensionMismatch(format!(
            "{} approximate shapes for {} tetrahedra",
            approx.len(),
            equations.tetrahedra()
        )));
    }

    // Precondition: no near-degenerate tetrahedra. Non-finite shapes fall
    // through the same gate.
    if !(min_imaginary_shape(approx) >= MIN_IMAGINARY_PART)
        || !approx.iter().all(|z| z.is_finite())
    {
        return Ok(VerificationResult::rejected(
            FailureReason::NotEnoughImaginaryPart,
        ));
    }

    let selected = select_rows(equations)?;

    let certified = match krawczyk_certify(equations, &selected, approx)? {
        Some(certified) => certified,
        None => {
            return Ok(VerificationResult::rejected(
                FailureReason::KrawczykTestFailed,
            ))
        }
    };

    if let Some(tetrahedron) = first_orientation_failure(&certified)? {
        return Ok(VerificationResult {
            verified: false,
            certified_shapes: Some(certified),
            failure: Some(FailureReason::NegativelyOriented { tetrahedron }),
            holonomy: Vec::new(),
        });
    }

    let holonomy = holonomy_sums(equations, &selected, &certified)?;
    let failure = first_holonomy_failure(&holonomy).map(|row| FailureReason::HolonomyMismatch { row });

    Ok(VerificationResult {
        verified: failure.is_none(),
        certified_shapes: Some(certified),
        failure,
        holonomy,
    })
}
