// Resampling primitives

/// `count` evenly spaced values from `start` to `stop`, both ends included.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            let mut out: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
            out[count - 1] = stop;
            out
        }
    }
}

/// The uniform axis spanning a channel's first to last timestamp with
/// `trunc(last - first)` samples.
pub fn uniform_axis(timestamps: &[f64]) -> Vec<f64> {
    match (timestamps.first(), timestamps.last()) {
        (Some(&t0), Some(&t1)) => linspace(t0, t1, (t1 - t0) as usize),
        _ => Vec::new(),
    }
}

/// Piecewise-linear interpolation of `(xp, fp)` at each `x`.
///
/// `xp` must be ascending. Points outside `[xp[0], xp[last]]` take the
/// boundary value. An empty `xp` yields NaN.
pub fn interp(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    let n = xp.len().min(fp.len());
    let (xp, fp) = (&xp[..n], &fp[..n]);
    x.iter().map(|&t| interp_at(t, xp, fp)).collect()
}

fn interp_at(t: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len();
    if n == 0 || t.is_nan() {
        return f64::NAN;
    }
    if t <= xp[0] {
        return fp[0];
    }
    if t >= xp[n - 1] {
        return fp[n - 1];
    }

    // xp[0] < t < xp[n-1], so 1 <= hi <= n-1
    let hi = xp.partition_point(|&v| v <= t);
    let lo = hi - 1;
    let frac = (t - xp[lo]) / (xp[hi] - xp[lo]);
    fp[lo] + (fp[hi] - fp[lo]) * frac
}
