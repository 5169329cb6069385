//! Two-sample Kolmogorov–Smirnov test.
//!
//! The statistic is the largest gap between the two empirical CDFs, evaluated
//! at every distinct pooled value so ties are handled. The two-sided p-value
//! is exact (lattice path probabilities) up to [`EXACT_MAX_N`] samples per
//! side and asymptotic beyond.

use std::cmp::Ordering;

use crate::common::error::{NetsecError, NetsecResult};

use super::domain::{KsMethod, KsOutcome};

/// Largest sample size for which the exact distribution is used.
pub const EXACT_MAX_N: usize = 10_000;

const ASYMPTOTIC_TERMS: u32 = 100;

/// KS test on two numeric samples. NaN values must be removed by the caller.
pub fn ks_2samp(base: &[f64], current: &[f64]) -> NetsecResult<KsOutcome> {
    if base.iter().chain(current).any(|v| v.is_nan()) {
        return Err(NetsecError::statistical(
            "ks_2samp",
            "samples must not contain NaN",
        ));
    }
    let mut a = base.to_vec();
    let mut b = current.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);
    test_sorted(&a, &b, f64::total_cmp)
}

/// KS test on two samples of any totally ordered type (text columns).
pub fn ks_2samp_ordered<T: Ord + Clone>(base: &[T], current: &[T]) -> NetsecResult<KsOutcome> {
    let mut a = base.to_vec();
    let mut b = current.to_vec();
    a.sort();
    b.sort();
    test_sorted(&a, &b, T::cmp)
}

fn test_sorted<T, F>(a: &[T], b: &[T], cmp: F) -> NetsecResult<KsOutcome>
where
    F: Fn(&T, &T) -> Ordering,
{
    if a.is_empty() || b.is_empty() {
        return Err(NetsecError::statistical(
            "ks_2samp",
            format!("empty sample (base {}, current {})", a.len(), b.len()),
        ));
    }

    let statistic = statistic_sorted(a, b, cmp);
    let (n1, n2) = (a.len(), b.len());

    let (p_value, method) = if n1.max(n2) <= EXACT_MAX_N {
        (exact_p_value(statistic, n1, n2), KsMethod::Exact)
    } else {
        (asymptotic_p_value(statistic, n1, n2), KsMethod::Asymptotic)
    };

    Ok(KsOutcome {
        statistic,
        p_value: p_value.clamp(0.0, 1.0),
        method,
    })
}

/// `sup |F_a - F_b|` over the pooled sample. Both slices must be sorted.
fn statistic_sorted<T, F>(a: &[T], b: &[T], cmp: F) -> f64
where
    F: Fn(&T, &T) -> Ordering,
{
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut d = 0.0f64;

    while i < a.len() && j < b.len() {
        let x = if cmp(&a[i], &b[j]) != Ordering::Greater {
            &a[i]
        } else {
            &b[j]
        };
        while i < a.len() && cmp(&a[i], x) == Ordering::Equal {
            i += 1;
        }
        while j < b.len() && cmp(&b[j], x) == Ordering::Equal {
            j += 1;
        }
        d = d.max((i as f64 / n1 - j as f64 / n2).abs());
    }

    d
}

/// `P(D >= d)` under the null.
///
/// Under the null every monotone lattice path from (0, 0) to (m, n) is equally
/// likely, so a path is walked as an urn draw: from (i, j) it steps down with
/// probability `(m - i) / (m - i + n - j)`. Probability mass is carried row by
/// row through the band `|i*n - j*m| <= h` and whatever crosses the band edge
/// is summed into the result, so small p-values keep their relative precision.
fn exact_p_value(d: f64, n1: usize, n2: usize) -> f64 {
    if d <= 0.0 {
        return 1.0;
    }
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    let (mi, ni) = (m as i64, n as i64);
    // Largest lattice distance still strictly below the observed D.
    let h = (d * (m as f64) * (n as f64) - 1e-7).floor() as i64;
    if h < 0 {
        return 1.0;
    }
    let window = |i: usize| -> (usize, usize) {
        let at = i as i64 * ni;
        let lo = (-(h - at).div_euclid(mi)).max(0);
        let hi = (at + h).div_euclid(mi).min(ni);
        (lo as usize, hi as usize)
    };
    let step_right = |i: usize, j: usize| (n - j) as f64 / (m - i + n - j) as f64;
    let step_down = |i: usize, j: usize| (m - i) as f64 / (m - i + n - j) as f64;

    let mut mass = vec![0.0f64; n + 1];
    mass[0] = 1.0;
    let mut outside = 0.0f64;
    let (mut lo, mut hi) = window(0);

    for i in 0..=m {
        if lo > hi {
            // No path stays inside the band.
            return 1.0;
        }
        for j in lo + 1..=hi {
            mass[j] += mass[j - 1] * step_right(i, j - 1);
        }
        if hi < n {
            outside += mass[hi] * step_right(i, hi);
        }
        if i == m {
            break;
        }

        let (next_lo, next_hi) = window(i + 1);
        for j in lo..=hi {
            let down = mass[j] * step_down(i, j);
            if j < next_lo {
                outside += down;
                mass[j] = 0.0;
            } else {
                mass[j] = down;
            }
        }
        (lo, hi) = (next_lo, next_hi);
    }

    outside
}

/// Kolmogorov limiting distribution with the Stephens small-sample correction.
fn asymptotic_p_value(d: f64, n1: usize, n2: usize) -> f64 {
    if d <= 0.0 {
        return 1.0;
    }
    let en = (n1 as f64 * n2 as f64) / (n1 + n2) as f64;
    let sqrt_en = en.sqrt();
    let lambda = (sqrt_en + 0.12 + 0.11 / sqrt_en) * d;
    kolmogorov_sf(lambda)
}

/// `Q_KS(λ) = 2 Σ (-1)^(k-1) exp(-2 k² λ²)`.
fn kolmogorov_sf(lambda: f64) -> f64 {
    let a2 = -2.0 * lambda * lambda;
    let mut sign = 1.0;
    let mut sum = 0.0;
    let mut prev_term = 0.0f64;

    for k in 1..=ASYMPTOTIC_TERMS {
        let kf = f64::from(k);
        let term = sign * 2.0 * (a2 * kf * kf).exp();
        sum += term;
        if term.abs() <= 1e-3 * prev_term || term.abs() <= 1e-8 * sum {
            return sum;
        }
        sign = -sign;
        prev_term = term.abs();
    }

    // Series did not settle: λ is tiny and the samples are indistinguishable.
    1.0
}
