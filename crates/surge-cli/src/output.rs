//! Output table formatting and display-side post-processing.

use std::io::{self, Write};

use surge_solver::TraceTable;

/// Write the dense table: `Time(s)` plus one column per probe, scientific
/// notation with six significant digits, one row per step including `t = 0`.
pub fn write_table<W: Write>(mut w: W, table: &TraceTable) -> io::Result<()> {
    write!(w, "Time(s)")?;
    for label in &table.labels {
        write!(w, ",{label}")?;
    }
    writeln!(w)?;

    for (row, &t) in table.times.iter().enumerate() {
        write!(w, "{t:.5e}")?;
        for column in &table.series {
            write!(w, ",{:.5e}", column[row])?;
        }
        writeln!(w)?;
    }
    w.flush()
}

/// Trailing two-point average, `y_i' = 0.5 * (y_i + y_{i-1})`, applied in
/// place to every trace. The `t = 0` row is left alone.
pub fn smooth(table: &mut TraceTable) {
    for column in &mut table.series {
        let mut prev = column.first().copied().unwrap_or(0.0);
        for y in column.iter_mut().skip(1) {
            let raw = *y;
            *y = 0.5 * (raw + prev);
            prev = raw;
        }
    }
}

/// Uniform downsampling to at most `target` rows, always keeping the first
/// and last row.
pub fn downsample(table: &TraceTable, target: usize) -> TraceTable {
    let len = table.len();
    if target == 0 || len <= target {
        return table.clone();
    }
    let last = len - 1;
    let keep: Vec<usize> = (0..target)
        .map(|k| k * last / (target - 1).max(1))
        .collect();

    let mut out = TraceTable {
        labels: table.labels.clone(),
        times: Vec::with_capacity(target),
        series: vec![Vec::with_capacity(target); table.series.len()],
    };
    for &row in &keep {
        out.times.push(table.times[row]);
        for (dst, src) in out.series.iter_mut().zip(&table.series) {
            dst.push(src[row]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TraceTable {
        TraceTable {
            labels: vec!["VC1".to_string()],
            times: vec![0.0, 1e-8, 2e-8, 3e-8],
            series: vec![vec![100.0, 90.0, 80.0, 70.0]],
        }
    }

    #[test]
    fn test_write_format() {
        let mut buf = Vec::new();
        write_table(&mut buf, &table()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Time(s),VC1"));
        assert_eq!(lines.next(), Some("0.00000e0,1.00000e2"));
        assert_eq!(lines.next(), Some("1.00000e-8,9.00000e1"));
    }

    #[test]
    fn test_smooth() {
        let mut t = table();
        smooth(&mut t);
        assert_eq!(t.series[0], vec![100.0, 95.0, 85.0, 75.0]);
    }

    #[test]
    fn test_downsample_keeps_endpoints() {
        let t = downsample(&table(), 2);
        assert_eq!(t.times, vec![0.0, 3e-8]);
        assert_eq!(t.series[0], vec![100.0, 70.0]);
    }

    #[test]
    fn test_downsample_noop_when_small() {
        let t = downsample(&table(), 10);
        assert_eq!(t.len(), 4);
    }
}
