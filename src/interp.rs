//! Shape-preserving piecewise cubic Hermite interpolation (PCHIP).
//!
//! Knot derivatives follow Fritsch & Carlson: a weighted harmonic mean of the
//! neighbouring secant slopes, forced to zero at local extrema, so the
//! interpolant never overshoots the samples. This matters for colour-matching
//! functions, whose long near-zero tails would otherwise ring into negative
//! (physically meaningless) weights.
//!
//! Interpolants do not extrapolate: evaluation outside the knot range yields
//! `None`.

use crate::error::{Error, Result};

/// A monotone-respecting interpolant over strictly increasing knots.
#[derive(Debug, Clone)]
pub struct Pchip {
    xs: Vec<f64>,
    ys: Vec<f64>,
    ds: Vec<f64>,
}

impl Pchip {
    /// Fit an interpolant through `(xs[i], ys[i])`.
    ///
    /// `xs` must be non-empty, finite and strictly increasing, and `ys` must
    /// have the same length.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(Error::InvalidArgument(format!(
                "interpolation knots: {} abscissae but {} ordinates",
                xs.len(),
                ys.len()
            )));
        }
        check_strictly_increasing(&xs, "interpolation knots")?;

        let ds = (0..xs.len()).map(|k| derivative(&xs, &ys, k)).collect();
        Ok(Self { xs, ys, ds })
    }

    /// Closed domain `[first knot, last knot]`.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Interpolated value at `x`, or `None` outside the domain.
    pub fn eval(&self, x: f64) -> Option<f64> {
        let k = segment(&self.xs, x)?;
        if k + 1 == self.xs.len() {
            return Some(self.ys[k]);
        }
        Some(hermite(
            self.xs[k],
            self.xs[k + 1],
            self.ys[k],
            self.ys[k + 1],
            self.ds[k],
            self.ds[k + 1],
            x,
        ))
    }

    /// Like [`Pchip::eval`] but out-of-domain points contribute zero.
    pub fn eval_or_zero(&self, x: f64) -> f64 {
        self.eval(x).unwrap_or(0.0)
    }

    /// Trapezoid area under the interpolant over `[from, to]`, sampled at
    /// most `step` apart. Out-of-domain points count as zero.
    pub fn area(&self, from: f64, to: f64, step: f64) -> f64 {
        if !(to > from) || !(step > 0.0) {
            return 0.0;
        }
        let n = ((to - from) / step).ceil().max(1.0) as usize;
        let h = (to - from) / n as f64;
        let inner: f64 = (1..n).map(|i| self.eval_or_zero(from + i as f64 * h)).sum();
        (0.5 * (self.eval_or_zero(from) + self.eval_or_zero(to)) + inner) * h
    }
}

/// Evaluate the PCHIP interpolant of `(xs, ys)` at a single point without
/// building a [`Pchip`]. Only the two knot derivatives bracketing `x` are
/// computed, which keeps per-pixel queries allocation free.
///
/// `xs` is assumed strictly increasing (see [`Pchip::new`]); empty or
/// mismatched slices yield `None`.
pub fn pchip_at(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    if xs.len() != ys.len() {
        return None;
    }
    let k = segment(xs, x)?;
    if k + 1 == xs.len() {
        return Some(ys[k]);
    }
    Some(hermite(
        xs[k],
        xs[k + 1],
        ys[k],
        ys[k + 1],
        derivative(xs, ys, k),
        derivative(xs, ys, k + 1),
        x,
    ))
}

/// Fail with `InvalidArgument` unless `xs` is non-empty, finite and strictly
/// increasing.
pub fn check_strictly_increasing(xs: &[f64], what: &str) -> Result<()> {
    if xs.is_empty() {
        return Err(Error::InvalidArgument(format!("{what}: empty")));
    }
    if let Some(i) = xs.iter().position(|x| !x.is_finite()) {
        return Err(Error::InvalidArgument(format!(
            "{what}: non-finite value at index {i}"
        )));
    }
    if let Some(i) = xs.windows(2).position(|w| w[1] <= w[0]) {
        return Err(Error::InvalidArgument(format!(
            "{what}: not strictly increasing at index {} ({} after {})",
            i + 1,
            xs[i + 1],
            xs[i]
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Index `k` of the segment `[xs[k], xs[k+1]]` holding `x`; the last knot maps
/// to itself. `None` outside the domain or for NaN.
fn segment(xs: &[f64], x: f64) -> Option<usize> {
    let last = xs.len().checked_sub(1)?;
    if !(x >= xs[0] && x <= xs[last]) {
        return None;
    }
    if x == xs[last] {
        return Some(last);
    }
    // First knot strictly greater than x, minus one.
    Some(xs.partition_point(|&k| k <= x) - 1)
}

fn slope(xs: &[f64], ys: &[f64], k: usize) -> f64 {
    (ys[k + 1] - ys[k]) / (xs[k + 1] - xs[k])
}

/// Fritsch-Carlson derivative at knot `k`, with the one-sided three-point
/// estimate at both ends.
fn derivative(xs: &[f64], ys: &[f64], k: usize) -> f64 {
    let n = xs.len();
    match n {
        1 => 0.0,
        2 => slope(xs, ys, 0),
        _ if k == 0 => edge_derivative(
            xs[1] - xs[0],
            xs[2] - xs[1],
            slope(xs, ys, 0),
            slope(xs, ys, 1),
        ),
        _ if k == n - 1 => edge_derivative(
            xs[n - 1] - xs[n - 2],
            xs[n - 2] - xs[n - 3],
            slope(xs, ys, n - 2),
            slope(xs, ys, n - 3),
        ),
        _ => {
            let (h0, h1) = (xs[k] - xs[k - 1], xs[k + 1] - xs[k]);
            let (m0, m1) = (slope(xs, ys, k - 1), slope(xs, ys, k));
            if m0 * m1 <= 0.0 {
                return 0.0;
            }
            let w1 = 2.0 * h1 + h0;
            let w2 = h1 + 2.0 * h0;
            (w1 + w2) / (w1 / m0 + w2 / m1)
        }
    }
}

fn edge_derivative(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

fn hermite(x0: f64, x1: f64, y0: f64, y1: f64, d0: f64, d1: f64, x: f64) -> f64 {
    let h = x1 - x0;
    let t = (x - x0) / h;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * y0 + h10 * h * d0 + h01 * y1 + h11 * h * d1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn passes_through_knots() {
        let xs = vec![1.0, 2.0, 4.0, 5.0, 7.0];
        let ys = vec![2.0, 3.0, 5.0, 4.0, 1.0];
        let p = Pchip::new(xs.clone(), ys.clone()).unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            assert_relative_eq!(p.eval(*x).unwrap(), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn reproduces_linear_data() {
        let xs = vec![0.0, 1.0, 3.0, 6.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        let p = Pchip::new(xs, ys).unwrap();
        for x in [0.5, 2.0, 4.5, 5.9] {
            assert_relative_eq!(p.eval(x).unwrap(), 2.0 * x + 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn no_overshoot_on_step() {
        let xs = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = vec![0.0, 0.0, 1.0, 1.0, 1.0];
        let p = Pchip::new(xs, ys).unwrap();
        for i in 0..=400 {
            let v = p.eval(i as f64 / 100.0).unwrap();
            assert!((0.0..=1.0).contains(&v), "overshoot {v} at {}", i as f64 / 100.0);
        }
    }

    #[test]
    fn does_not_extrapolate() {
        let p = Pchip::new(vec![400.0, 500.0, 600.0], vec![0.1, 0.5, 0.2]).unwrap();
        assert_eq!(p.eval(399.999), None);
        assert_eq!(p.eval(600.001), None);
        assert_eq!(p.eval(f64::NAN), None);
        assert_eq!(p.eval_or_zero(700.0), 0.0);
        assert_eq!(p.domain(), (400.0, 600.0));
    }

    #[test]
    fn single_point_domain() {
        let p = Pchip::new(vec![550.0], vec![0.7]).unwrap();
        assert_eq!(p.eval(550.0), Some(0.7));
        assert_eq!(p.eval(551.0), None);
    }

    #[test]
    fn pointwise_matches_fitted() {
        let xs = vec![400.0, 410.0, 430.0, 435.0, 460.0, 500.0];
        let ys = vec![0.0, 0.3, 0.9, 0.8, 0.2, 0.25];
        let p = Pchip::new(xs.clone(), ys.clone()).unwrap();
        for i in 0..=100 {
            let x = 400.0 + i as f64;
            assert_relative_eq!(
                pchip_at(&xs, &ys, x).unwrap(),
                p.eval(x).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn pointwise_on_empty_or_ragged_slices_is_none() {
        assert_eq!(pchip_at(&[], &[], 500.0), None);
        assert_eq!(pchip_at(&[400.0, 500.0], &[0.1], 450.0), None);
        assert_eq!(pchip_at(&[500.0], &[0.4], 500.0), Some(0.4));
    }

    #[test]
    fn area_of_linear_data_is_exact() {
        let p = Pchip::new(vec![0.0, 10.0, 20.0], vec![0.0, 1.0, 2.0]).unwrap();
        assert_relative_eq!(p.area(0.0, 20.0, 1.0), 20.0, epsilon = 1e-12);
        assert_relative_eq!(p.area(5.0, 10.0, 0.3), 3.75, epsilon = 1e-12);
        // Outside the knots counts as zero.
        assert_relative_eq!(p.area(-10.0, 0.0, 1.0), 0.0);
        assert_eq!(p.area(10.0, 5.0, 1.0), 0.0);
    }

    #[test]
    fn rejects_bad_knots() {
        assert!(matches!(
            Pchip::new(vec![1.0, 1.0], vec![0.0, 0.0]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Pchip::new(vec![], vec![]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Pchip::new(vec![1.0, 2.0], vec![0.0]),
            Err(Error::InvalidArgument(_))
        ));
    }
}
