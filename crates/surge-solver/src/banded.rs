//! Pentadiagonal elimination for the series fast path.

use surge_core::BandSystem;

use crate::stamp::PIVOT_FLOOR;

/// Replace a near-zero pivot by `sign * PIVOT_FLOOR`.
///
/// Structurally zero diagonals appear on terminal rows and on phantom KCL
/// rows before fill-in reaches them; the floor keeps the sweep defined while
/// the zero checks below keep it from ever dividing real data by the floor.
#[inline]
fn floored(x: f64) -> f64 {
    if x.abs() < PIVOT_FLOOR {
        if x < 0.0 {
            -PIVOT_FLOOR
        } else {
            PIVOT_FLOOR
        }
    } else {
        x
    }
}

/// Eliminate the five-band system in place; the solution lands in `b`.
///
/// One forward sweep clears the two sub-diagonals, then back substitution
/// runs over the two super-diagonals. No pivoting: the shunt/series row
/// alternation keeps every used pivot away from zero once the rows above it
/// have been folded in.
pub fn solve_banded(sys: &mut BandSystem) {
    let n = sys.size();
    if n == 0 {
        return;
    }

    for i in 0..n - 1 {
        sys.d[i] = floored(sys.d[i]);
        if sys.l1[i + 1] != 0.0 {
            let f = sys.l1[i + 1] / sys.d[i];
            sys.d[i + 1] -= f * sys.u1[i];
            sys.u1[i + 1] -= f * sys.u2[i];
            sys.b[i + 1] -= f * sys.b[i];
        }
        if i + 2 < n && sys.l2[i + 2] != 0.0 {
            let f = sys.l2[i + 2] / sys.d[i];
            sys.l1[i + 2] -= f * sys.u1[i];
            sys.d[i + 2] -= f * sys.u2[i];
            sys.b[i + 2] -= f * sys.b[i];
        }
    }
    sys.d[n - 1] = floored(sys.d[n - 1]);

    sys.b[n - 1] /= sys.d[n - 1];
    if n >= 2 {
        sys.b[n - 2] = (sys.b[n - 2] - sys.u1[n - 2] * sys.b[n - 1]) / sys.d[n - 2];
    }
    for i in (0..n.saturating_sub(2)).rev() {
        sys.b[i] = (sys.b[i] - sys.u1[i] * sys.b[i + 1] - sys.u2[i] * sys.b[i + 2]) / sys.d[i];
    }
}
