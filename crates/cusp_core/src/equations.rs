//! Thurston gluing equations in their two integer forms, and the selection
//! of a maximal independent subsystem.
//!
//! Each row carries the logarithmic coefficients (per tetrahedron, one
//! triple multiplying log z, log(1/(1-z)), log((z-1)/z)) and the equivalent
//! rectangular data (powers of z and 1-z plus a sign, so the equation reads
//! ∏ zᵢ^{Aᵢ}(1-zᵢ)^{Bᵢ} = sign). The verifier consumes the rectangular
//! form; the holonomy validator consumes the logarithmic one.

use crate::CuspError;
use serde::{Deserialize, Serialize};

/// Geometric meaning of a gluing equation row, which fixes its holonomy
/// target: 0·π for a completeness equation, 2·π for a filling or edge
/// equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    CompleteCusp,
    FilledCusp,
    Edge,
}

impl RowKind {
    /// Expected argument sum of the row, in units of π.
    pub fn target_over_pi(&self) -> f64 {
        match self {
            RowKind::CompleteCusp => 0.0,
            RowKind::FilledCusp | RowKind::Edge => 2.0,
        }
    }
}

/// One gluing equation row over all tetrahedra, in both forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GluingRow {
    pub kind: RowKind,
    /// Logarithmic coefficients: `[a, b, c]` per tetrahedron, multiplying
    /// log z, log(1/(1-z)), log((z-1)/z).
    pub log: Vec<[i64; 3]>,
    /// Rectangular powers of z, one per tetrahedron.
    pub rect_z: Vec<i64>,
    /// Rectangular powers of 1-z, one per tetrahedron.
    pub rect_one_minus_z: Vec<i64>,
    /// Right-hand side of the rectangular equation, +1 or -1.
    pub rect_sign: i8,
}

/// The full candidate equation system: cusp rows first, then edge rows,
/// consistently indexed across both forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GluingEquations {
    tetrahedra: usize,
    rows: Vec<GluingRow>,
}

impl GluingEquations {
    pub fn new(tetrahedra: usize, rows: Vec<GluingRow>) -> Result<Self, CuspError> {
        if tetrahedra == 0 {
            return Err(CuspError::DimensionMismatch(
                "triangulation has zero tetrahedra".into(),
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.log.len() != tetrahedra
                || row.rect_z.len() != tetrahedra
                || row.rect_one_minus_z.len() != tetrahedra
            {
                return Err(CuspError::DimensionMismatch(format!(
                    "row {} has coefficients for {} tetrahedra, expected {}",
                    i,
                    row.log.len().min(row.rect_z.len()).min(row.rect_one_minus_z.len()),
                    tetrahedra
                )));
            }
            if row.rect_sign != 1 && row.rect_sign != -1 {
                return Err(CuspError::DimensionMismatch(format!(
                    "row {} has rectangular sign {}, expected +1 or -1",
                    i, row.rect_sign
                )));
            }
        }
        Ok(Self { tetrahedra, rows })
    }

    pub fn tetrahedra(&self) -> usize {
        self.tetrahedra
    }

    pub fn rows(&self) -> &[GluingRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &GluingRow {
        &self.rows[index]
    }
}

/// Picks exactly `tetrahedra` rows that are linearly independent over the
/// integers, in input order (cusp rows come first by contract, so their
/// geometric meaning is retained whenever possible). A row is accepted the
/// first time it enlarges the rank of the running basis; no row is
/// revisited.
pub fn select_rows(equations: &GluingEquations) -> Result<Vec<usize>, CuspError> {
    let needed = equations.tetrahedra();
    let mut basis = RowBasis::new();
    let mut selected = Vec::with_capacity(needed);

    for (index, row) in equations.rows().iter().enumerate() {
        if selected.len() == needed {
            break;
        }
        let flat: Vec<i64> = row.log.iter().flat_map(|t| t.iter().copied()).collect();
        if basis.try_insert(&flat) {
            selected.push(index);
        }
    }

    if selected.len() < needed {
        return Err(CuspError::InsufficientRank {
            needed,
            found: selected.len(),
        });
    }
    Ok(selected)
}

/// A row-echelon basis over the integers, grown one row at a time.
/// Elimination is fraction-free (cross-multiplication) in i128, with a gcd
/// normalization after every combination step to keep entries small.
struct RowBasis {
    /// Rows in echelon form, sorted by pivot column, paired with the pivot.
    rows: Vec<(usize, Vec<i128>)>,
}

impl RowBasis {
    fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Reduces `candidate` against the basis; if a nonzero remainder is
    /// left, the candidate enlarges the span, is stored, and `true` is
    /// returned.
    fn try_insert(&mut self, candidate: &[i64]) -> bool {
        let mut r: Vec<i128> = candidate.iter().map(|&v| v as i128).collect();

        for (pivot, row) in &self.rows {
            if r[*pivot] == 0 {
                continue;
            }
            let (rp, bp) = (r[*pivot], row[*pivot]);
            for (rv, bv) in r.iter_mut().zip(row.iter()) {
                *rv = bp * *rv - rp * *bv;
            }
            normalize(&mut r);
        }

        match r.iter().position(|&v| v != 0) {
            Some(pivot) => {
                // Reduction zeroed every basis pivot column, so this pivot
                // is new and the search lands on an insertion point.
                let at = match self.rows.binary_search_by_key(&pivot, |(p, _)| *p) {
                    Ok(at) | Err(at) => at,
                };
                self.rows.insert(at, (pivot, r));
                true
            }
            None => false,
        }
    }
}

/// Divides the row by the gcd of its entries.
fn normalize(row: &mut [i128]) {
    let mut g: i128 = 0;
    for &v in row.iter() {
        g = gcd(g, v.abs());
        if g == 1 {
            return;
        }
    }
    if g > 1 {
        for v in row.iter_mut() {
            *v /= g;
        }
    }
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_row(log: Vec<[i64; 3]>) -> GluingRow {
        let rect_z = log.iter().map(|t| t[0] - t[2]).collect();
        let rect_one_minus_z = log.iter().map(|t| t[2] - t[1]).collect();
        let c_sum: i64 = log.iter().map(|t| t[2]).sum();
        GluingRow {
            kind: RowKind::Edge,
            log,
            rect_z,
            rect_one_minus_z,
            rect_sign: if c_sum % 2 == 0 { 1 } else { -1 },
        }
    }

    fn cusp_row(log: Vec<[i64; 3]>) -> GluingRow {
        GluingRow {
            kind: RowKind::CompleteCusp,
            ..edge_row(log)
        }
    }

    #[test]
    fn constructor_rejects_bad_dimensions() {
        let row = edge_row(vec![[1, 0, 0]]);
        let err = GluingEquations::new(2, vec![row]).expect_err("wrong width");
        assert!(matches!(err, CuspError::DimensionMismatch(_)));

        assert!(matches!(
            GluingEquations::new(0, Vec::new()),
            Err(CuspError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn constructor_rejects_bad_sign() {
        let mut row = edge_row(vec![[1, 0, 0]]);
        row.rect_sign = 3;
        assert!(matches!(
            GluingEquations::new(1, vec![row]),
            Err(CuspError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn selects_cusp_row_then_first_independent_edge_row() {
        // Figure-eight knot complement: meridian first, then two edge rows.
        let eqns = GluingEquations::new(
            2,
            vec![
                cusp_row(vec![[1, 0, 0], [0, -1, 0]]),
                edge_row(vec![[2, 1, 0], [1, 0, 2]]),
                edge_row(vec![[0, 1, 2], [1, 2, 0]]),
            ],
        )
        .expect("consistent system");

        let selected = select_rows(&eqns).expect("full rank");
        assert_eq!(selected, vec![0, 1]);
    }

    #[test]
    fn selection_is_deterministic() {
        let eqns = GluingEquations::new(
            2,
            vec![
                cusp_row(vec![[1, 0, 0], [0, -1, 0]]),
                edge_row(vec![[2, 1, 0], [1, 0, 2]]),
                edge_row(vec![[0, 1, 2], [1, 2, 0]]),
            ],
        )
        .expect("consistent system");

        let first = select_rows(&eqns).expect("full rank");
        let second = select_rows(&eqns).expect("full rank");
        assert_eq!(first, second);
    }

    #[test]
    fn dependent_rows_are_skipped() {
        // Row 1 is a multiple of row 0; row 2 restores full rank.
        let eqns = GluingEquations::new(
            2,
            vec![
                cusp_row(vec![[1, 0, 0], [0, -1, 0]]),
                edge_row(vec![[2, 0, 0], [0, -2, 0]]),
                edge_row(vec![[0, 1, 2], [1, 2, 0]]),
            ],
        )
        .expect("consistent system");

        assert_eq!(select_rows(&eqns).expect("full rank"), vec![0, 2]);
    }

    #[test]
    fn linear_combinations_are_detected() {
        // Row 2 = row 0 + row 1, so only two of three candidates are
        // independent and a third tetrahedron cannot be covered.
        let eqns = GluingEquations::new(
            3,
            vec![
                edge_row(vec![[1, 0, 0], [0, 1, 0], [0, 0, 1]]),
                edge_row(vec![[0, 1, 0], [1, 0, 1], [1, 1, 0]]),
                edge_row(vec![[1, 1, 0], [1, 1, 1], [1, 1, 1]]),
            ],
        )
        .expect("consistent system");

        assert_eq!(
            select_rows(&eqns),
            Err(CuspError::InsufficientRank {
                needed: 3,
                found: 2
            })
        );
    }

    #[test]
    fn insufficient_rank_reports_counts() {
        let eqns = GluingEquations::new(
            2,
            vec![
                cusp_row(vec![[1, 0, 0], [0, -1, 0]]),
                edge_row(vec![[2, 0, 0], [0, -2, 0]]),
            ],
        )
        .expect("consistent system");

        assert_eq!(
            select_rows(&eqns),
            Err(CuspError::InsufficientRank {
                needed: 2,
                found: 1
            })
        );
    }
}
