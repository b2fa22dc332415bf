#![forbid(unsafe_code)]

//! Core domain model and computation for the Gluco monitoring system.
//!
//! This crate provides:
//! - Domain types (events, the append-only event log, time series)
//! - Glucose trajectory simulation (explicit Euler ODE integration)
//! - Calculus analysis (polynomial fit, derivative, exposure, critical points)
//! - The interactive session state machine
//! - Persistence (JSONL event journal, CSV export)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod journal;
pub mod export;
pub mod simulator;
pub mod analysis;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, SimulationParams};
pub use journal::{read_events, EventSink, JsonlSink};
pub use export::write_series_csv;
pub use simulator::simulate;
pub use analysis::{analyze, AnalysisResult, Polynomial, AVERAGING_WINDOW_MINUTES};
pub use session::{Command, Extractor, Outcome, Phase, Session};
