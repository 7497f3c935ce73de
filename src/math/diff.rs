//! Differencing and integration helpers.
//!
//! `difference` applies `(1 - B)^d`; `integrate_step` inverts one step of it
//! given the preceding levels, which is what forecasting needs to move from the
//! differenced scale back to megawatts.

/// Apply d-order differencing. The result is `d` elements shorter than the input.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Lag-`lag` difference aligned to the input: position `i` holds
/// `values[i] - values[i - lag]`, and the first `lag` positions are `None`.
pub fn lag_difference(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (lag > 0 && i >= lag).then(|| v - values[i - lag]))
        .collect()
}

/// Recover the next level from its d-th difference.
///
/// `history` must end with at least `d` levels preceding the new value:
/// `y_t = w_t - Σ_{k=1..d} C(d,k) (-1)^k y_{t-k}`.
pub fn integrate_step(history: &[f64], w_next: f64, d: usize) -> f64 {
    let n = history.len();
    let mut y = w_next;
    for k in 1..=d.min(n) {
        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        y += sign * binomial(d, k) * history[n - k];
    }
    y
}

fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_difference() {
        let series = vec![10.0, 12.0, 15.0, 14.0, 18.0];
        let diff = difference(&series, 1);
        assert_eq!(diff, vec![2.0, 3.0, -1.0, 4.0]);
    }

    #[test]
    fn second_difference_and_short_input() {
        assert_eq!(difference(&[1.0, 4.0, 9.0, 16.0], 2), vec![2.0, 2.0]);
        assert!(difference(&[1.0], 1).is_empty());
        assert_eq!(difference(&[1.0, 2.0], 0), vec![1.0, 2.0]);
    }

    #[test]
    fn lag_difference_leaves_head_empty() {
        let out = lag_difference(&[1.0, 2.0, 4.0, 8.0], 2);
        assert_eq!(out, vec![None, None, Some(3.0), Some(6.0)]);
        assert!(lag_difference(&[1.0, 2.0], 5).iter().all(Option::is_none));
    }

    #[test]
    fn integrate_step_inverts_difference() {
        let series = vec![3.0, 5.0, 10.0, 11.0, 20.0];
        for d in 0..=2 {
            let w = difference(&series, d);
            let last_w = *w.last().unwrap();
            let rebuilt = integrate_step(&series[..series.len() - 1], last_w, d);
            assert!((rebuilt - 20.0).abs() < 1e-12, "d={d} rebuilt={rebuilt}");
        }
    }
}
