//! The `cusp_core` crate certifies approximate hyperbolic structures on
//! ideally-triangulated 3-manifolds: given uncertified tetrahedron shapes
//! from a numerical solver, it proves with interval arithmetic that a true
//! solution of the gluing equations exists nearby, that every tetrahedron
//! is positively oriented, and that the solution carries the intended
//! completion and filling data.
//!
//! Key components:
//! - **interval / complex**: outward-rounded real and rectangular complex
//!   interval arithmetic (the enclosure property everything else rests on).
//! - **equations**: the gluing equation system in logarithmic and
//!   rectangular form, and the exact-rank selection of an independent
//!   subsystem.
//! - **krawczyk**: the interval Krawczyk containment test certifying
//!   existence and local uniqueness of a root.
//! - **geometry**: orientation and argument-sum (holonomy) acceptance of
//!   the certified root.
//! - **verify**: the single-shot, side-effect-free entry point.

pub mod complex;
pub mod equations;
pub mod geometry;
pub mod interval;
pub mod krawczyk;
pub mod verify;

use thiserror::Error;

/// Fatal data inconsistencies. Expected negative outcomes of the
/// verification itself are not errors; they are reported through
/// `verify::FailureReason`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CuspError {
    /// The candidate equations do not span the tetrahedron degrees of
    /// freedom; the system must never be verified rank-deficient.
    #[error("gluing equations provide only {found} independent rows, {needed} needed")]
    InsufficientRank { needed: usize, found: usize },
    /// Row widths, shape counts, or signs do not fit the triangulation.
    #[error("{0}")]
    DimensionMismatch(String),
    /// An interval operation left its domain on data that should have
    /// been screened out earlier.
    #[error(transparent)]
    Interval(#[from] interval::IntervalError),
}
