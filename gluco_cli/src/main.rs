use chrono::Utc;
use clap::{Parser, Subcommand};
use gluco_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

mod chart;
mod extractor;

use extractor::RuleBasedExtractor;

#[derive(Parser)]
#[command(name = "gluco")]
#[command(about = "Glucose trajectory simulator and calculus analyzer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the simulated window length, in hours
    #[arg(long, global = true)]
    hours: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive monitoring loop (default)
    Run,

    /// One-shot report over the journaled event history
    Report {
        /// Also export the time series to this CSV path
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    gluco_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    let mut params = config.model.clone();
    if let Some(hours) = cli.hours {
        params.total_hours = hours;
    }

    match cli.command {
        Some(Commands::Report { csv }) => cmd_report(&data_dir, &params, csv.as_deref()),
        Some(Commands::Run) | None => cmd_run(&data_dir, params),
    }
}

fn journal_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("events.jsonl")
}

fn cmd_run(data_dir: &std::path::Path, params: SimulationParams) -> Result<()> {
    let journal = journal_path(data_dir);
    let log = read_events(&journal)?;
    if !log.is_empty() {
        println!("Resuming with {} journaled events.", log.len());
    }

    let mut sink = JsonlSink::new(&journal);
    let extractor = RuleBasedExtractor::new();
    let mut session = Session::with_log(log, Utc::now(), params);

    println!("Describe a meal or some exercise, e.g. \"I ate 30 grams of carbs\".");
    println!("Say \"skip forward one hour\" to advance the clock, \"quit\" to exit.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break, // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match session.handle(parse_command(line), &extractor)? {
            Outcome::Terminated => break,

            Outcome::ClockAdvanced(now) => {
                println!(
                    "Skipped forward. Current simulated time: {}",
                    now.format("%H:%M:%S")
                );
            }

            Outcome::Discarded { transcript } => {
                println!("Couldn't recognize \"{}\". Skipping this event.", transcript);
            }

            Outcome::Report {
                event,
                series,
                analysis,
            } => {
                sink.append(&event)?;
                display_event(&event);
                println!();
                print!("{}", chart::render(&series));
                println!();
                print!("{}", analysis.summary());
            }
        }
    }

    Ok(())
}

fn cmd_report(
    data_dir: &std::path::Path,
    params: &SimulationParams,
    csv: Option<&std::path::Path>,
) -> Result<()> {
    let log = read_events(&journal_path(data_dir))?;
    if log.is_empty() {
        println!("No events journaled yet - nothing to report.");
        return Ok(());
    }

    let series = simulate(&log, params)?;
    let analysis = analyze(&series)?;

    println!("Report over {} events:\n", log.len());
    print!("{}", chart::render(&series));
    println!();
    print!("{}", analysis.summary());

    if let Some(csv_path) = csv {
        let rows = write_series_csv(&series, csv_path)?;
        println!("\nExported {} samples to {}", rows, csv_path.display());
    }

    Ok(())
}

fn parse_command(line: &str) -> Command {
    let lower = line.to_lowercase();
    if lower == "quit" || lower == "exit" {
        Command::Terminate
    } else if lower.contains("skip forward one hour") || lower == "skip" {
        Command::SkipForward(chrono::Duration::hours(1))
    } else {
        Command::Transcript(line.to_string())
    }
}

fn display_event(event: &Event) {
    let mut parts = Vec::new();
    if let Some(carbs) = event.carbs {
        parts.push(format!("{:.0} g carbs", carbs));
    }
    if let Some(activity) = event.activity {
        match event.duration_minutes {
            Some(duration) => parts.push(format!("{} for {:.0} min", activity, duration)),
            None => parts.push(activity.to_string()),
        }
    }
    println!(
        "Logged at {}: {}",
        event.timestamp.format("%H:%M:%S"),
        parts.join(", ")
    );
}
