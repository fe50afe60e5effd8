//! Rolling-window primitives shared by the indicator families.
//!
//! Semantics match a fixed-size trailing window with no partial windows:
//! output[t] covers `values[t+1-window..=t]` and is NaN when fewer than
//! `window` values exist or any value in the window is NaN.

/// Rolling arithmetic mean.
pub fn mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window {
        return out;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for i in 0..n {
        let entering = values[i];
        if entering.is_nan() {
            nan_count += 1;
        } else {
            sum += entering;
        }
        if i >= window {
            let leaving = values[i - window];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }
        if i + 1 >= window && nan_count == 0 {
            out[i] = sum / window as f64;
        }
    }
    out
}

/// Rolling sample standard deviation (divides by `window - 1`).
///
/// A window of 1 has no sample deviation and yields NaN throughout.
pub fn sample_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window < 2 || n < window {
        return out;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let m = slice.iter().sum::<f64>() / window as f64;
        let var = slice.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (window - 1) as f64;
        out[i] = var.sqrt();
    }
    out
}

/// Rolling maximum.
pub fn max(values: &[f64], window: usize) -> Vec<f64> {
    extreme(values, window, f64::max)
}

/// Rolling minimum.
pub fn min(values: &[f64], window: usize) -> Vec<f64> {
    extreme(values, window, f64::min)
}

fn extreme(values: &[f64], window: usize, pick: fn(f64, f64) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window {
        return out;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = slice.iter().copied().fold(slice[0], pick);
    }
    out
}

/// Shift a series forward by `periods` bars: `out[t] = values[t - periods]`.
///
/// The first `periods` slots become NaN.
pub fn shift(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if periods < n {
        out[periods..].copy_from_slice(&values[..n - periods]);
    }
    out
}

/// Fractional change over `periods` bars: `values[t] / values[t - periods] - 1`.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if periods == 0 {
        return out;
    }
    for i in periods..n {
        let prev = values[i - periods];
        let curr = values[i];
        if prev.is_nan() || curr.is_nan() || prev == 0.0 {
            continue;
        }
        out[i] = curr / prev - 1.0;
    }
    out
}
