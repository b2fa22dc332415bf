//! Glucose trajectory simulation.
//!
//! The model is a single-compartment ODE integrated with explicit Euler:
//!
//! ```text
//! dG/dt = -k_insulin * (G - baseline) + carb_input(t) - activity_burn(t)
//! ```
//!
//! Each logged event contributes a time-shifted, exponentially decaying
//! forcing term: carbohydrate absorption (capped per event, 30-minute
//! time constant by default) raises glucose, exercise (capped per event,
//! 40-minute time constant) lowers it. The restoring term pulls the level
//! back toward baseline. Contributions superpose additively across the
//! whole event history, so the trajectory is recomputed in full on every
//! run.

use crate::{Error, EventLog, Result, SimulationParams, TimeSeries};
use chrono::{DateTime, Utc};

/// Minutes elapsed from `anchor` to `timestamp` (negative if earlier).
fn minutes_since(anchor: DateTime<Utc>, timestamp: DateTime<Utc>) -> f64 {
    (timestamp - anchor).num_milliseconds() as f64 / 60_000.0
}

/// Simulate the glucose trajectory for the full event history.
///
/// Produces a [`TimeSeries`] on a fixed `grid_step_minutes` grid from 0
/// to `total_hours * 60` inclusive, with minute offsets measured from the
/// first event's timestamp. `levels[0]` is the baseline and every level
/// is clamped to `floor_mg_dl` from below. The log must contain at least
/// one event; the first event anchors the time origin.
pub fn simulate(log: &EventLog, params: &SimulationParams) -> Result<TimeSeries> {
    params.validate()?;

    let anchor = log
        .first()
        .ok_or_else(|| Error::Simulation("event log is empty".into()))?
        .timestamp;

    let step = params.grid_step_minutes;
    let samples = (params.total_minutes() / step).round() as usize + 1;
    let times: Vec<f64> = (0..samples).map(|i| i as f64 * step).collect();

    // Event offsets are fixed for the whole run; hoist them out of the grid loop.
    let offsets: Vec<f64> = log.iter().map(|e| minutes_since(anchor, e.timestamp)).collect();

    let mut levels = vec![0.0; samples];
    levels[0] = params.baseline_mg_dl;

    for i in 1..samples {
        // Explicit Euler: the flux is evaluated at the step's start, so an
        // event landing exactly on a grid point takes effect in the step
        // that leaves it.
        let t = times[i - 1];
        let dt = times[i] - times[i - 1];
        let glucose = levels[i - 1];

        let mut carb_input = 0.0;
        let mut activity_burn = 0.0;
        for (event, &t_event) in log.iter().zip(&offsets) {
            let elapsed = t - t_event;
            if elapsed < 0.0 {
                // Events cannot influence the past
                continue;
            }

            let carbs = event.carbs.unwrap_or(0.0);
            carb_input += carbs.min(params.carb_cap_grams)
                * (-elapsed / params.carb_decay_minutes).exp();

            if event.activity.is_some() {
                let duration = event.duration_minutes.unwrap_or(0.0);
                activity_burn += duration.min(params.activity_cap_minutes)
                    * (-elapsed / params.activity_decay_minutes).exp();
            }
        }

        let flux = -params.k_insulin * (glucose - params.baseline_mg_dl) + carb_input
            - activity_burn;

        // The reference-step divisor reproduces the model's literal update
        // rule; validate() guarantees it matches the grid spacing, making
        // the scaling factor an identity.
        levels[i] =
            (glucose + flux * dt / params.reference_step_minutes).max(params.floor_mg_dl);
    }

    tracing::debug!(
        events = log.len(),
        samples,
        end_minute = times[samples - 1],
        "simulated glucose trajectory"
    );

    Ok(TimeSeries { times, levels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activity, Event};
    use chrono::{Duration, Utc};

    fn log_of(events: Vec<Event>) -> EventLog {
        events.into_iter().collect()
    }

    fn carb_event(at: DateTime<Utc>, grams: f64) -> Event {
        Event::new(at, Some(grams), None, None)
    }

    #[test]
    fn test_grid_shape_and_anchoring() {
        let log = log_of(vec![carb_event(Utc::now(), 30.0)]);
        let series = simulate(&log, &SimulationParams::default()).unwrap();

        assert_eq!(series.len(), 73); // 0..=360 in 5-minute steps
        assert_eq!(series.times[0], 0.0);
        assert_eq!(series.end_minute(), 360.0);
        assert_eq!(series.levels[0], 100.0);
    }

    #[test]
    fn test_baseline_invariance_without_forcing() {
        // An event with no carb information and no activity adds no forcing
        // term, and the restoring force is already zero at baseline.
        let log = log_of(vec![Event::new(Utc::now(), None, None, None)]);
        let series = simulate(&log, &SimulationParams::default()).unwrap();
        assert!(series.levels.iter().all(|&g| g == 100.0));

        let log = log_of(vec![carb_event(Utc::now(), 0.0)]);
        let series = simulate(&log, &SimulationParams::default()).unwrap();
        assert!(series.levels.iter().all(|&g| g == 100.0));
    }

    #[test]
    fn test_single_event_first_step_is_exact() {
        // One 80 g event at the anchor: the first Euler step sees the full
        // undecayed carb input (elapsed = 0), no restoring force, so the
        // level lands on 100 + 80 exactly.
        let log = log_of(vec![carb_event(Utc::now(), 80.0)]);
        let series = simulate(&log, &SimulationParams::default()).unwrap();

        assert_eq!(series.levels[0], 100.0);
        assert_eq!(series.levels[1], 180.0);
    }

    #[test]
    fn test_carb_cap_enforced() {
        let at = Utc::now();
        let capped = simulate(&log_of(vec![carb_event(at, 500.0)]), &SimulationParams::default())
            .unwrap();
        let exact = simulate(&log_of(vec![carb_event(at, 80.0)]), &SimulationParams::default())
            .unwrap();

        // Bit-for-bit identical: anything above the cap is indistinguishable
        assert_eq!(capped.levels, exact.levels);
    }

    #[test]
    fn test_floor_clamp_under_heavy_activity() {
        let log = log_of(vec![Event::new(
            Utc::now(),
            None,
            Some(Activity::Run),
            Some(500.0), // capped at 60 minutes
        )]);
        let series = simulate(&log, &SimulationParams::default()).unwrap();

        let min = series.levels.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(min, 40.0);
        assert!(series.levels.iter().all(|&g| g >= 40.0));
    }

    #[test]
    fn test_decay_monotone_after_peak() {
        let log = log_of(vec![carb_event(Utc::now(), 50.0)]);
        let series = simulate(&log, &SimulationParams::default()).unwrap();

        let peak_idx = series
            .levels
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();

        for i in (peak_idx + 1)..series.len() {
            assert!(
                series.levels[i] < series.levels[i - 1],
                "levels must strictly decrease after the peak (index {})",
                i
            );
        }

        // Approaches baseline from above, never undershoots it
        assert!(*series.levels.last().unwrap() > 100.0);
        assert!(*series.levels.last().unwrap() < 110.0);
    }

    #[test]
    fn test_later_event_takes_effect_at_its_offset() {
        let start = Utc::now();
        let log = log_of(vec![
            Event::new(start, None, None, None),
            carb_event(start + Duration::hours(2), 80.0),
        ]);
        let series = simulate(&log, &SimulationParams::default()).unwrap();

        // Flat at baseline until the second event's offset (minute 120)
        let idx_120 = series.times.iter().position(|&t| t == 120.0).unwrap();
        assert!(series.levels[..=idx_120].iter().all(|&g| g == 100.0));
        assert_eq!(series.levels[idx_120 + 1], 180.0);
    }

    #[test]
    fn test_empty_log_is_an_error() {
        let err = simulate(&EventLog::new(), &SimulationParams::default()).unwrap_err();
        assert!(matches!(err, Error::Simulation(_)));
    }

    #[test]
    fn test_mismatched_reference_step_is_an_error() {
        let params = SimulationParams {
            grid_step_minutes: 5.0,
            reference_step_minutes: 1.0,
            ..Default::default()
        };
        let log = log_of(vec![carb_event(Utc::now(), 30.0)]);
        assert!(matches!(simulate(&log, &params), Err(Error::Config(_))));
    }

    #[test]
    fn test_activity_lowers_trajectory() {
        let at = Utc::now();
        let meal_only = simulate(&log_of(vec![carb_event(at, 40.0)]), &SimulationParams::default())
            .unwrap();
        let meal_and_walk = simulate(
            &log_of(vec![Event::new(
                at,
                Some(40.0),
                Some(Activity::Walk),
                Some(30.0),
            )]),
            &SimulationParams::default(),
        )
        .unwrap();

        for i in 1..meal_only.len() {
            assert!(meal_and_walk.levels[i] < meal_only.levels[i]);
        }
    }
}
