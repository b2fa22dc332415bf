//! Terminal rendering of a simulated trajectory.
//!
//! Consumes only `(times, levels)`; the core makes no assumption about
//! presentation beyond that contract.

use gluco_core::{TimeSeries, HYPERGLYCEMIA_MG_DL, HYPOGLYCEMIA_MG_DL};

const BAR_WIDTH: f64 = 48.0;
const ROW_EVERY_MINUTES: f64 = 30.0;

/// Render an ASCII chart of the trajectory, one row per half hour, with
/// hypo-/hyperglycemia markers and the overall peak.
pub fn render(series: &TimeSeries) -> String {
    let floor = 40.0;
    let top = series
        .levels
        .iter()
        .fold(HYPERGLYCEMIA_MG_DL, |acc, &g| acc.max(g));

    let mut out = String::new();
    for (&t, &g) in series.times.iter().zip(&series.levels) {
        if (t % ROW_EVERY_MINUTES).abs() > 1e-9 {
            continue;
        }
        let filled = (((g - floor) / (top - floor)) * BAR_WIDTH).round().max(0.0) as usize;
        let marker = if g >= HYPERGLYCEMIA_MG_DL {
            "  ! high"
        } else if g <= HYPOGLYCEMIA_MG_DL {
            "  ! low"
        } else {
            ""
        };
        out.push_str(&format!(
            "{:>4} min | {:<width$} {:6.1} mg/dL{}\n",
            t as i64,
            "#".repeat(filled),
            g,
            marker,
            width = BAR_WIDTH as usize,
        ));
    }

    if let Some((minute, level)) = series.peak() {
        out.push_str(&format!(
            "Peak: {:.0} mg/dL at {:.0} min\n",
            level, minute
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_thresholds_and_peak() {
        let series = TimeSeries {
            times: (0..=12).map(|i| i as f64 * 5.0).collect(),
            levels: vec![
                100.0, 140.0, 170.0, 185.0, 195.0, 198.0, 200.0, 160.0, 120.0, 90.0, 75.0, 70.0,
                65.0,
            ],
        };
        let chart = render(&series);

        assert!(chart.contains("0 min"));
        assert!(chart.contains("! high"));
        assert!(chart.contains("! low"));
        assert!(chart.contains("Peak: 200 mg/dL at 30 min"));
        // Only every sixth sample becomes a row (plus the peak footer)
        assert_eq!(chart.lines().count(), 4);
    }
}
