// scorewatch-core/src/domain/stats.rs
//
// Small numeric toolkit shared by the scorers. Semantics follow the usual
// dataframe conventions: linear-interpolated quantiles, equal-width bin edges,
// half-open bins with the last one closed on the right.

/// Keeps the present values of a coerced column.
pub fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Quantile of an already sorted slice with linear interpolation between order statistics.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), q)
}

/// `bins + 1` equal-width edges spanning the data. A constant column gets a
/// unit-wide range centred on the value so that every bin has positive width.
pub fn histogram_bin_edges(values: &[f64], bins: usize) -> Option<Vec<f64>> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let step = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| lo + step * i as f64).collect();
    edges.push(hi);
    Some(edges)
}

/// Counts values per bin. Bin `i` is `[edges[i], edges[i + 1])`, except the
/// last which also includes its right edge. Values outside the edges are not counted.
pub fn histogram(values: &[f64], edges: &[f64]) -> Vec<u64> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let bins = edges.len() - 1;
    let first = edges[0];
    let last = edges[bins];
    let mut counts = vec![0u64; bins];

    for &v in values {
        if !v.is_finite() || v < first || v > last {
            continue;
        }
        let idx = if v == last {
            bins - 1
        } else {
            // number of edges <= v, minus one
            edges.partition_point(|&e| e <= v) - 1
        };
        counts[idx.min(bins - 1)] += 1;
    }
    counts
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_linear_interpolation() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 1.0), Some(10.0));
        assert_eq!(quantile(&v, 0.5), Some(5.5));
        let q40 = quantile(&v, 0.4).unwrap();
        assert!((q40 - 4.6).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_bin_edges_equal_width() {
        let edges = histogram_bin_edges(&[0.0, 10.0, 5.0], 5).unwrap();
        assert_eq!(edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_bin_edges_constant_column() {
        let edges = histogram_bin_edges(&[3.0, 3.0], 2).unwrap();
        assert_eq!(edges, vec![2.5, 3.0, 3.5]);
        assert_eq!(histogram(&[3.0, 3.0], &edges), vec![0, 2]);
    }

    #[test]
    fn test_histogram_last_bin_is_closed() {
        let edges = [0.0, 1.0, 2.0, 3.0];
        let counts = histogram(&[0.0, 0.5, 1.0, 2.999, 3.0, 3.5, -0.1], &edges);
        assert_eq!(counts, vec![2, 1, 2]);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }
}
