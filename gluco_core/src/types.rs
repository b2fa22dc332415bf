//! Core domain types for the Gluco monitoring system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Physiological events (meals, exercise) and the append-only event log
//! - Extraction results produced by transcript collaborators
//! - The discretized glucose time series produced by the simulator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hyperglycemia reference level (mg/dL), used only for presentation.
pub const HYPERGLYCEMIA_MG_DL: f64 = 180.0;

/// Hypoglycemia reference level (mg/dL), used only for presentation.
pub const HYPOGLYCEMIA_MG_DL: f64 = 70.0;

// ============================================================================
// Events
// ============================================================================

/// Recognized physical activity kinds
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Walk,
    Jog,
    Run,
    Bike,
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Activity::Walk => "walk",
            Activity::Jog => "jog",
            Activity::Run => "run",
            Activity::Bike => "bike",
        };
        f.write_str(name)
    }
}

/// A recorded physiological event. Immutable once appended to the log.
///
/// Events are stamped with the simulated clock at the time they were
/// reported, not wall-clock time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Carbohydrate content in grams; `None` means no carb information.
    pub carbs: Option<f64>,
    pub activity: Option<Activity>,
    /// Exercise duration in minutes; meaningful only when `activity` is set.
    pub duration_minutes: Option<f64>,
}

impl Event {
    /// Create a new event stamped with the given (simulated) time.
    ///
    /// Negative quantities are clamped to zero; both are physically
    /// non-negative by definition.
    pub fn new(
        timestamp: DateTime<Utc>,
        carbs: Option<f64>,
        activity: Option<Activity>,
        duration_minutes: Option<f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            carbs: carbs.map(|c| c.max(0.0)),
            activity,
            duration_minutes: duration_minutes.map(|d| d.max(0.0)),
        }
    }
}

/// Append-only sequence of events, ordered by append time.
///
/// This is the only state that accumulates across simulation runs. There
/// is deliberately no API to mutate or remove an event once appended.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog(Vec<Event>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: Event) {
        self.0.push(event);
    }

    /// The first event anchors the simulation time origin.
    pub fn first(&self) -> Option<&Event> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Event> for EventLog {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Structured fields extracted from a free-form transcript by a
/// collaborator (see [`crate::session::Extractor`]).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Extraction {
    pub carbs: Option<f64>,
    pub activity: Option<Activity>,
    pub duration_minutes: Option<f64>,
}

impl Extraction {
    /// An extraction carrying neither carbs nor activity is discarded.
    pub fn is_empty(&self) -> bool {
        self.carbs.is_none() && self.activity.is_none()
    }
}

// ============================================================================
// Time series
// ============================================================================

/// Discretized glucose trajectory, regenerated on every simulation run.
///
/// `times` holds minute offsets from the first event's timestamp on a
/// fixed grid; `levels` holds glucose concentrations (mg/dL) aligned
/// index-for-index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeSeries {
    pub times: Vec<f64>,
    pub levels: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Last minute offset of the simulated window.
    pub fn end_minute(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Peak glucose level and the minute at which it occurs.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.levels
            .iter()
            .zip(&self.times)
            .max_by(|a, b| a.0.partial_cmp(b.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(level, minute)| (*minute, *level))
    }
}
