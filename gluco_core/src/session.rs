//! Interactive monitoring session, modeled as an explicit state machine.
//!
//! A session owns the append-only event log, the simulated clock, and the
//! model parameters. External commands (a new transcript, a clock skip,
//! termination) drive it through its phases; simulation and analysis stay
//! pure functions of the accumulated log, recomputed in full on every
//! accepted event.

use crate::{
    analyze, simulate, AnalysisResult, Error, Event, EventLog, Extraction, Result,
    SimulationParams, TimeSeries,
};
use chrono::{DateTime, Duration, Utc};

/// Structured-field extraction from a free-form transcript.
///
/// Implementations are collaborators (rule-based parsers, model-backed
/// services); the core only consumes their [`Extraction`] output.
pub trait Extractor {
    fn extract(&self, transcript: &str) -> Result<Extraction>;
}

/// Processing phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingInput,
    Extracting,
    Simulating,
    Reporting,
}

/// External command driving the session.
#[derive(Clone, Debug)]
pub enum Command {
    /// A new transcript to extract an event from.
    Transcript(String),
    /// Advance the simulated clock.
    SkipForward(Duration),
    /// End the session.
    Terminate,
}

/// Result of handling one command.
#[derive(Debug)]
pub enum Outcome {
    /// The transcript carried neither carbs nor activity; nothing logged.
    Discarded { transcript: String },
    /// The simulated clock moved; carries the new current time.
    ClockAdvanced(DateTime<Utc>),
    /// An event was accepted and the full pipeline re-ran.
    Report {
        event: Event,
        series: TimeSeries,
        analysis: AnalysisResult,
    },
    Terminated,
}

/// One interactive monitoring session.
pub struct Session {
    log: EventLog,
    now: DateTime<Utc>,
    params: SimulationParams,
    phase: Phase,
}

impl Session {
    /// Start a session with an empty log at the given simulated time.
    pub fn new(start: DateTime<Utc>, params: SimulationParams) -> Self {
        Self {
            log: EventLog::new(),
            now: start,
            params,
            phase: Phase::AwaitingInput,
        }
    }

    /// Resume a session over a previously accumulated log.
    pub fn with_log(log: EventLog, now: DateTime<Utc>, params: SimulationParams) -> Self {
        Self {
            log,
            now,
            params,
            phase: Phase::AwaitingInput,
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Current simulated time; new events are stamped with this value.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Handle one external command.
    pub fn handle(&mut self, command: Command, extractor: &dyn Extractor) -> Result<Outcome> {
        match command {
            Command::Terminate => {
                self.phase = Phase::AwaitingInput;
                tracing::info!(events = self.log.len(), "session terminated");
                Ok(Outcome::Terminated)
            }

            Command::SkipForward(delta) => {
                self.now = self
                    .now
                    .checked_add_signed(delta)
                    .ok_or_else(|| Error::Other("clock skip out of range".into()))?;
                tracing::info!(now = %self.now, "simulated clock advanced");
                Ok(Outcome::ClockAdvanced(self.now))
            }

            Command::Transcript(transcript) => self.handle_transcript(transcript, extractor),
        }
    }

    fn handle_transcript(
        &mut self,
        transcript: String,
        extractor: &dyn Extractor,
    ) -> Result<Outcome> {
        self.phase = Phase::Extracting;
        let extraction = match extractor.extract(&transcript) {
            Ok(extraction) => extraction,
            Err(e) => {
                self.phase = Phase::AwaitingInput;
                return Err(e);
            }
        };

        if extraction.is_empty() {
            tracing::info!(%transcript, "no carbs or activity recognized, discarding");
            self.phase = Phase::AwaitingInput;
            return Ok(Outcome::Discarded { transcript });
        }

        let event = Event::new(
            self.now,
            extraction.carbs,
            extraction.activity,
            extraction.duration_minutes,
        );
        self.log.append(event.clone());

        self.phase = Phase::Simulating;
        let series = simulate(&self.log, &self.params)?;

        self.phase = Phase::Reporting;
        let analysis = analyze(&series)?;

        self.phase = Phase::AwaitingInput;
        Ok(Outcome::Report {
            event,
            series,
            analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Activity;

    /// Canned extractor for driving the state machine in tests.
    struct FixedExtractor(Extraction);

    impl Extractor for FixedExtractor {
        fn extract(&self, _transcript: &str) -> Result<Extraction> {
            Ok(self.0.clone())
        }
    }

    fn meal_extractor(grams: f64) -> FixedExtractor {
        FixedExtractor(Extraction {
            carbs: Some(grams),
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_extraction_is_discarded() {
        let mut session = Session::new(Utc::now(), SimulationParams::default());
        let extractor = FixedExtractor(Extraction::default());

        let outcome = session
            .handle(Command::Transcript("mumbling".into()), &extractor)
            .unwrap();

        assert!(matches!(outcome, Outcome::Discarded { .. }));
        assert!(session.log().is_empty());
        assert_eq!(session.phase(), Phase::AwaitingInput);
    }

    #[test]
    fn test_transcript_runs_full_pipeline() {
        let mut session = Session::new(Utc::now(), SimulationParams::default());
        let outcome = session
            .handle(
                Command::Transcript("I ate 30 grams of carbs".into()),
                &meal_extractor(30.0),
            )
            .unwrap();

        match outcome {
            Outcome::Report {
                event,
                series,
                analysis,
            } => {
                assert_eq!(event.carbs, Some(30.0));
                assert_eq!(series.levels[0], 100.0);
                assert_eq!(analysis.end_minute, 360.0);
            }
            other => panic!("expected Report, got {:?}", other),
        }
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.phase(), Phase::AwaitingInput);
    }

    #[test]
    fn test_clock_skip_stamps_later_events() {
        let start = Utc::now();
        let mut session = Session::new(start, SimulationParams::default());
        let extractor = meal_extractor(20.0);

        session
            .handle(Command::Transcript("breakfast".into()), &extractor)
            .unwrap();

        let outcome = session
            .handle(Command::SkipForward(Duration::hours(1)), &extractor)
            .unwrap();
        match outcome {
            Outcome::ClockAdvanced(now) => assert_eq!(now, start + Duration::hours(1)),
            other => panic!("expected ClockAdvanced, got {:?}", other),
        }

        match session
            .handle(Command::Transcript("snack".into()), &extractor)
            .unwrap()
        {
            Outcome::Report { event, .. } => {
                assert_eq!(event.timestamp, start + Duration::hours(1));
            }
            other => panic!("expected Report, got {:?}", other),
        }
    }

    #[test]
    fn test_full_recompute_covers_whole_history() {
        let start = Utc::now();
        let mut session = Session::new(start, SimulationParams::default());

        let walk = FixedExtractor(Extraction {
            activity: Some(Activity::Walk),
            duration_minutes: Some(30.0),
            ..Default::default()
        });

        session
            .handle(Command::Transcript("lunch".into()), &meal_extractor(60.0))
            .unwrap();
        session
            .handle(Command::SkipForward(Duration::hours(1)), &walk)
            .unwrap();
        let outcome = session
            .handle(Command::Transcript("went walking".into()), &walk)
            .unwrap();

        match outcome {
            Outcome::Report { series, .. } => {
                // Both events feed the recomputed trajectory: the meal's
                // rise is visible well before the walk's timestamp.
                assert!(series.levels[2] > 100.0);
                assert_eq!(session.log().len(), 2);
            }
            other => panic!("expected Report, got {:?}", other),
        }
    }

    #[test]
    fn test_terminate() {
        let mut session = Session::new(Utc::now(), SimulationParams::default());
        let outcome = session
            .handle(Command::Terminate, &meal_extractor(10.0))
            .unwrap();
        assert!(matches!(outcome, Outcome::Terminated));
    }
}
