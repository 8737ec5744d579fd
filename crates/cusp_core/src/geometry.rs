//! Geometric acceptance of a certified box: positive orientation of every
//! tetrahedron across the whole box, and the argument-sum (holonomy)
//! condition of every selected equation row.
//!
//! Certification alone proves a root of the algebraic system exists in the
//! box; these checks prove it is the geometrically intended one, the
//! branch whose completeness rows sum to 0·π and whose filling and edge
//! rows sum to 2·π.

use crate::complex::IntervalComplex;
use crate::equations::GluingEquations;
use crate::interval::Interval;
use crate::krawczyk::CertifiedBox;
use crate::CuspError;
use serde::{Deserialize, Serialize};

/// Half-width of the acceptance window around the 0 and 2 targets. Far
/// wider than the argument enclosures of a certified box, far narrower
/// than the gap between the targets.
pub const HOLONOMY_TOLERANCE: f64 = 1e-6;

/// The interval argument sum of one selected row, in units of π.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowHolonomy {
    /// Index of the row within the full candidate system.
    pub row: usize,
    /// Expected sum: 0 for a completeness row, 2 for filling and edge rows.
    pub target_over_pi: f64,
    /// Interval-computed sum of the weighted arguments, divided by π.
    pub angle_sum_over_pi: Interval,
}

impl RowHolonomy {
    /// True when the computed interval reaches the target window.
    pub fn holds(&self) -> bool {
        self.angle_sum_over_pi.lo <= self.target_over_pi + HOLONOMY_TOLERANCE
            && self.angle_sum_over_pi.hi >= self.target_over_pi - HOLONOMY_TOLERANCE
    }
}

/// Checks that every tetrahedron of the box is positively oriented: the
/// imaginary parts of z, 1/(1-z) and (z-1)/z must be entirely positive.
/// Returns the first offending tetrahedron, or `None` when all pass.
///
/// The z check runs first: it guarantees the box avoids 0 and 1, so the
/// two derived quantities are then defined on the whole box.
pub fn first_orientation_failure(certified: &CertifiedBox) -> Result<Option<usize>, CuspError> {
    let one = IntervalComplex::one();
    for (i, z) in certified.shapes().iter().enumerate() {
        if !z.im.is_positive() {
            return Ok(Some(i));
        }
        let second = (one - *z).recip()?;
        if !second.im.is_positive() {
            return Ok(Some(i));
        }
        let third = (*z - one).div(z)?;
        if !third.im.is_positive() {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

/// Interval argument sums of every selected row over the certified box,
/// in row order.
pub fn holonomy_sums(
    equations: &GluingEquations,
    selected: &[usize],
    certified: &CertifiedBox,
) -> Result<Vec<RowHolonomy>, CuspError> {
    let one = IntervalComplex::one();
    let pi = Interval::pi();

    // Arguments of z, 1/(1-z), (z-1)/z per tetrahedron, computed once.
    let mut args = Vec::with_capacity(certified.len());
    for z in certified.shapes() {
        let a0 = z.arg()?;
        let a1 = (one - *z).recip()?.arg()?;
        let a2 = (*z - one).div(z)?.arg()?;
        args.push([a0, a1, a2]);
    }

    let mut sums = Vec::with_capacity(selected.len());
    for &index in selected {
        let row = equations.row(index);
        let mut sum = Interval::point(0.0);
        for (triple, arg) in row.log.iter().zip(args.iter()) {
            for t in 0..3 {
                if triple[t] != 0 {
                    sum = sum + Interval::point(triple[t] as f64) * arg[t];
                }
            }
        }
        sums.push(RowHolonomy {
            row: index,
            target_over_pi: row.kind.target_over_pi(),
            angle_sum_over_pi: sum.div(&pi)?,
        });
    }
    Ok(sums)
}

/// First row whose argument sum misses its target window, if any.
pub fn first_holonomy_failure(sums: &[RowHolonomy]) -> Option<usize> {
    sums.iter().find(|h| !h.holds()).map(|h| h.row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::{GluingEquations, GluingRow, RowKind};
    use crate::krawczyk::krawczyk_certify;
    use num_complex::Complex64;

    fn regular_shape() -> Complex64 {
        Complex64::new(0.5, 3f64.sqrt() / 2.0)
    }

    fn m004() -> GluingEquations {
        GluingEquations::new(
            2,
            vec![
                GluingRow {
                    kind: RowKind::CompleteCusp,
                    log: vec![[1, 0, 0], [0, -1, 0]],
                    rect_z: vec![1, 0],
                    rect_one_minus_z: vec![0, 1],
                    rect_sign: 1,
                },
                GluingRow {
                    kind: RowKind::Edge,
                    log: vec![[2, 1, 0], [1, 0, 2]],
                    rect_z: vec![2, -1],
                    rect_one_minus_z: vec![-1, 2],
                    rect_sign: 1,
                },
            ],
        )
        .expect("consistent system")
    }

    fn certified_m004() -> CertifiedBox {
        let eqns = m004();
        let approx = vec![regular_shape(), regular_shape()];
        krawczyk_certify(&eqns, &[0, 1], &approx)
            .expect("consistent data")
            .expect("regular solution certifies")
    }

    #[test]
    fn regular_tetrahedra_are_positively_oriented() {
        let certified = certified_m004();
        assert_eq!(
            first_orientation_failure(&certified).expect("box avoids 0 and 1"),
            None
        );
    }

    #[test]
    fn box_with_nonpositive_imaginary_part_fails_orientation() {
        // Take the good box for tetrahedron 0, and a box whose imaginary
        // part dips to zero for tetrahedron 1.
        let good = certified_m004();
        let mut shapes: Vec<IntervalComplex> = good.shapes().to_vec();
        shapes[1] = IntervalComplex::new(Interval::new(0.4, 0.6), Interval::new(-1e-12, 0.9));
        let tampered = CertifiedBox::new(shapes);

        assert_eq!(
            first_orientation_failure(&tampered).expect("box avoids 0 and 1"),
            Some(1)
        );
    }

    #[test]
    fn holonomy_of_the_complete_structure() {
        let eqns = m004();
        let certified = certified_m004();
        let sums = holonomy_sums(&eqns, &[0, 1], &certified).expect("upper half plane");

        assert_eq!(sums.len(), 2);
        // Meridian of the complete cusp: argument sum 0·π.
        assert_eq!(sums[0].row, 0);
        assert_eq!(sums[0].target_over_pi, 0.0);
        assert!(sums[0].angle_sum_over_pi.contains(0.0));
        assert!(sums[0].holds());
        // Edge row: argument sum 2·π.
        assert_eq!(sums[1].row, 1);
        assert_eq!(sums[1].target_over_pi, 2.0);
        assert!(sums[1].angle_sum_over_pi.contains(2.0));
        assert!(sums[1].holds());

        assert_eq!(first_holonomy_failure(&sums), None);
    }

    #[test]
    fn wrong_target_is_reported() {
        let sums = vec![
            RowHolonomy {
                row: 0,
                target_over_pi: 0.0,
                angle_sum_over_pi: Interval::with_radius(0.0, 1e-10),
            },
            RowHolonomy {
                row: 3,
                target_over_pi: 2.0,
                angle_sum_over_pi: Interval::with_radius(0.0, 1e-10),
            },
        ];
        assert!(sums[0].holds());
        assert!(!sums[1].holds());
        assert_eq!(first_holonomy_failure(&sums), Some(3));
    }
}
