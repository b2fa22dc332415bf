//! Calculus analysis of a simulated glucose trajectory.
//!
//! Given a `(times, levels)` series this module fits a closed-form
//! polynomial approximation by least squares, differentiates it exactly,
//! integrates the sampled levels with composite Simpson quadrature, and
//! locates the real critical points of the fitted curve inside the
//! simulated window.

use crate::{Error, Result, TimeSeries};
use nalgebra::{DMatrix, DVector};

/// Fixed divisor for the average-exposure figure, in minutes.
///
/// The reference model divides by six hours' worth of minutes regardless
/// of the actual window length. Kept as a named constant so a corrected
/// variant can divide by `series.end_minute()` explicitly instead.
pub const AVERAGING_WINDOW_MINUTES: f64 = 360.0;

/// Maximum degree of the fitted polynomial.
const MAX_FIT_DEGREE: usize = 5;

// ============================================================================
// Polynomial
// ============================================================================

/// Dense univariate polynomial with ascending coefficients
/// (`coeffs[i]` multiplies `t^i`).
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    pub fn new(coeffs: Vec<f64>) -> Self {
        Self { coeffs }
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Evaluate at `t` (Horner's scheme).
    pub fn eval(&self, t: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c)
    }

    /// Exact term-wise derivative.
    pub fn derivative(&self) -> Polynomial {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &c)| c * i as f64)
            .collect();
        Polynomial { coeffs }
    }

    /// Effective coefficients with numerically dead leading terms removed.
    ///
    /// Least-squares fits of low-complexity data leave high-order
    /// coefficients that are zero up to rounding; treating them as a real
    /// degree would poison the companion matrix. A term is dead when its
    /// largest contribution over the domain is negligible against the
    /// polynomial's overall scale there (high-order coefficients of a
    /// wide-domain fit are legitimately tiny in raw form).
    fn trimmed(&self, span: f64) -> &[f64] {
        let span = span.abs().max(1.0);
        let contribution = |k: usize, c: f64| c.abs() * span.powi(k as i32);
        let scale = self
            .coeffs
            .iter()
            .enumerate()
            .fold(0.0_f64, |acc, (k, &c)| acc.max(contribution(k, c)));
        let tol = 1e-7 * scale;
        let len = self
            .coeffs
            .iter()
            .enumerate()
            .rev()
            .find(|&(k, &c)| contribution(k, c) > tol)
            .map_or(0, |(k, _)| k + 1);
        &self.coeffs[..len]
    }

    /// Real roots within the closed range `[lo, hi]`, sorted ascending.
    ///
    /// Roots are the eigenvalues of the monic companion matrix; complex
    /// eigenvalues with a non-negligible imaginary part are discarded, as
    /// are real roots outside the range. A constant (or identically zero)
    /// polynomial yields no roots.
    pub fn real_roots_in(&self, lo: f64, hi: f64) -> Vec<f64> {
        let coeffs = self.trimmed(lo.abs().max(hi.abs()));
        if coeffs.len() < 2 {
            return Vec::new();
        }

        let degree = coeffs.len() - 1;
        let lead = coeffs[degree];
        let companion = DMatrix::from_fn(degree, degree, |r, c| {
            if c == degree - 1 {
                -coeffs[r] / lead
            } else if r == c + 1 {
                1.0
            } else {
                0.0
            }
        });

        let mut roots: Vec<f64> = companion
            .complex_eigenvalues()
            .iter()
            .filter(|e| e.im.abs() <= 1e-8 * (1.0 + e.re.abs()))
            .map(|e| e.re)
            .filter(|&t| t >= lo && t <= hi)
            .collect();

        roots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        roots.dedup_by(|a, b| (*a - *b).abs() <= 1e-6);
        roots
    }
}

impl std::fmt::Display for Polynomial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn magnitude(c: f64) -> String {
            if c == 0.0 || (c.abs() >= 1e-3 && c.abs() < 1e6) {
                format!("{:.4}", c.abs())
            } else {
                format!("{:.4e}", c.abs())
            }
        }

        let mut wrote = false;
        for (power, &c) in self.coeffs.iter().enumerate().rev() {
            if c == 0.0 && self.coeffs.len() > 1 {
                continue;
            }
            if wrote {
                f.write_str(if c < 0.0 { " - " } else { " + " })?;
            } else if c < 0.0 {
                f.write_str("-")?;
            }
            match power {
                0 => write!(f, "{}", magnitude(c))?,
                1 => write!(f, "{}*t", magnitude(c))?,
                _ => write!(f, "{}*t^{}", magnitude(c), power)?,
            }
            wrote = true;
        }
        if !wrote {
            f.write_str("0")?;
        }
        Ok(())
    }
}

// ============================================================================
// Quadrature
// ============================================================================

/// Composite Simpson quadrature of uniformly sampled values.
///
/// Simpson's rule pairs intervals; with an odd interval count the final
/// interval is integrated with the trapezoid rule instead. The default
/// simulation grid always produces an even interval count.
fn simpson(times: &[f64], values: &[f64]) -> f64 {
    debug_assert_eq!(times.len(), values.len());
    let n = times.len();
    if n < 2 {
        return 0.0;
    }
    if n == 2 {
        return (times[1] - times[0]) * (values[0] + values[1]) / 2.0;
    }

    let h = times[1] - times[0];
    let intervals = n - 1;
    let paired_end = if intervals % 2 == 0 { n } else { n - 1 };

    let mut total = 0.0;
    let mut i = 0;
    while i + 2 < paired_end {
        total += h / 3.0 * (values[i] + 4.0 * values[i + 1] + values[i + 2]);
        i += 2;
    }

    if paired_end < n {
        total += (times[n - 1] - times[n - 2]) * (values[n - 2] + values[n - 1]) / 2.0;
    }

    total
}

// ============================================================================
// Analysis
// ============================================================================

/// Derived calculus summary of one simulated trajectory. Not persisted.
#[derive(Clone, Debug)]
pub struct AnalysisResult {
    /// Closed-form least-squares approximation `G(t)` of the trajectory.
    pub curve: Polynomial,
    /// Exact derivative `dG/dt` of the fitted curve.
    pub derivative: Polynomial,
    /// Definite integral of the sampled levels over the window (mg*min/dL).
    pub total_exposure: f64,
    /// `total_exposure / AVERAGING_WINDOW_MINUTES` (mg/dL).
    pub average_exposure: f64,
    /// Real zeros of `dG/dt` within `[0, end]`, ascending.
    pub critical_points: Vec<f64>,
    /// Last minute offset of the analyzed window.
    pub end_minute: f64,
}

impl AnalysisResult {
    /// Render the human-readable report from the stored values.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("Fitted glucose curve:\n");
        out.push_str(&format!("  G(t) = {}\n", self.curve));
        out.push_str("Rate of change:\n");
        out.push_str(&format!("  dG/dt = {}\n", self.derivative));
        out.push_str(&format!(
            "Total glucose exposure over {} min: {} mg*min/dL\n",
            self.end_minute as i64, self.total_exposure as i64
        ));
        out.push_str(&format!(
            "Average glucose exposure: {:.2} mg/dL\n",
            self.average_exposure
        ));
        if self.critical_points.is_empty() {
            out.push_str("Critical points (dG/dt = 0) within range: none\n");
        } else {
            out.push_str("Critical points (dG/dt = 0) within range:\n");
            for t in &self.critical_points {
                out.push_str(&format!("  t = {:.2} min\n", t));
            }
        }
        out
    }
}

/// Analyze a simulated trajectory.
///
/// Fits a polynomial of degree `min(len - 1, 5)` by least squares,
/// differentiates it, integrates the sampled levels, and reports the real
/// critical points of the fit inside the window. The series must contain
/// at least two samples.
pub fn analyze(series: &TimeSeries) -> Result<AnalysisResult> {
    if series.len() < 2 {
        return Err(Error::Analysis(
            "time series must contain at least two samples".into(),
        ));
    }

    let curve = fit_polynomial(&series.times, &series.levels)?;
    let derivative = curve.derivative();

    let total_exposure = simpson(&series.times, &series.levels);
    let average_exposure = total_exposure / AVERAGING_WINDOW_MINUTES;

    let end_minute = series.end_minute();
    let critical_points = derivative.real_roots_in(0.0, end_minute);

    tracing::debug!(
        degree = curve.coeffs().len().saturating_sub(1),
        total_exposure,
        critical_points = critical_points.len(),
        "analyzed glucose trajectory"
    );

    Ok(AnalysisResult {
        curve,
        derivative,
        total_exposure,
        average_exposure,
        critical_points,
        end_minute,
    })
}

/// Least-squares fit of degree `min(len - 1, MAX_FIT_DEGREE)` via SVD of
/// the Vandermonde matrix. Degenerate inputs reduce the degree silently.
fn fit_polynomial(times: &[f64], levels: &[f64]) -> Result<Polynomial> {
    let degree = (times.len() - 1).min(MAX_FIT_DEGREE);

    let vandermonde =
        DMatrix::from_fn(times.len(), degree + 1, |r, c| times[r].powi(c as i32));
    let rhs = DVector::from_column_slice(levels);

    let svd = vandermonde.svd(true, true);
    let solution = svd
        .solve(&rhs, 1e-12)
        .map_err(|e| Error::Analysis(format!("least-squares fit failed: {}", e)))?;

    Ok(Polynomial::new(solution.iter().copied().collect()))
}
