//! Dense solve for branched systems.
//!
//! Attachment edits break the pentadiagonal band, so circuits with branches
//! fall back to LU with partial pivoting on the expanded matrix. Node counts
//! stay modest in branched decks; the band never grows past the edit list,
//! so dense expansion is the simplest correct representation.

use nalgebra::{DMatrix, DVector};

use crate::stamp::PIVOT_FLOOR;

/// Floor near-zero diagonals, then solve `m x = rhs` by LU.
///
/// Returns `None` when the factorization finds no pivot, which survives the
/// flooring only if a whole row or column cancels.
pub fn solve_dense(m: &mut DMatrix<f64>, rhs: &DVector<f64>) -> Option<DVector<f64>> {
    for i in 0..m.nrows() {
        let d = m[(i, i)];
        if d.abs() < PIVOT_FLOOR {
            m[(i, i)] = if d < 0.0 { -PIVOT_FLOOR } else { PIVOT_FLOOR };
        }
    }
    m.clone().lu().solve(rhs)
}

/// Row with the weakest diagonal, reported when a solve fails.
pub fn weakest_diagonal(m: &DMatrix<f64>) -> usize {
    let mut row = 0;
    let mut best = f64::INFINITY;
    for i in 0..m.nrows() {
        let mag = m[(i, i)].abs();
        if mag < best {
            best = mag;
            row = i;
        }
    }
    row
}
