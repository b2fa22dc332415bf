//! Rule-based transcript extraction.
//!
//! A keyword parser standing in for the model-backed extractor: explicit
//! carb grams, exercise verbs with durations, and a small food lookup
//! table for common meals. Anything it cannot recognize comes back empty
//! and is discarded by the session.

use gluco_core::{Activity, Extraction, Extractor, Result};

/// Approximate carbohydrate content of common foods, in grams.
const FOOD_CARBS: &[(&str, f64)] = &[
    ("ham sandwich", 30.0),
    ("pizza", 30.0),
    ("orange juice", 25.0),
    ("cereal", 40.0),
    ("toast", 15.0),
    ("banana", 27.0),
    ("apple", 20.0),
];

#[derive(Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for RuleBasedExtractor {
    fn extract(&self, transcript: &str) -> Result<Extraction> {
        let text = transcript.to_lowercase();
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric() && c != '.')
                    .to_string()
            })
            .collect();

        let mut carbs = None;
        let mut activity = None;
        let mut duration = None;

        for (i, word) in words.iter().enumerate() {
            if activity.is_none() {
                activity = activity_keyword(word);
            }
            if carbs.is_none() && word.starts_with("carb") {
                // "30 grams of carbs" puts the number a few words back
                carbs = number_before(&words, i, 4);
            }
            if duration.is_none() && is_minutes_unit(word) {
                duration = number_before(&words, i, 2);
            }
            if duration.is_none() && is_hours_unit(word) {
                duration = number_before(&words, i, 2).map(|h| h * 60.0);
            }
        }

        if carbs.is_none() {
            carbs = FOOD_CARBS
                .iter()
                .find(|(food, _)| text.contains(food))
                .map(|&(_, grams)| grams);
        }

        // A duration without a recognized activity carries no information
        if activity.is_none() {
            duration = None;
        }

        Ok(Extraction {
            carbs,
            activity,
            duration_minutes: duration,
        })
    }
}

fn activity_keyword(word: &str) -> Option<Activity> {
    match word {
        "walk" | "walked" | "walking" | "stroll" => Some(Activity::Walk),
        "jog" | "jogged" | "jogging" => Some(Activity::Jog),
        "run" | "running" | "ran" => Some(Activity::Run),
        "bike" | "biked" | "biking" | "cycle" | "cycled" | "cycling" | "rode" => {
            Some(Activity::Bike)
        }
        _ => None,
    }
}

fn is_minutes_unit(word: &str) -> bool {
    matches!(word, "minute" | "minutes" | "min" | "mins")
}

fn is_hours_unit(word: &str) -> bool {
    matches!(word, "hour" | "hours" | "hr" | "hrs")
}

fn parse_number(word: &str) -> Option<f64> {
    if let Ok(n) = word.parse::<f64>() {
        return Some(n);
    }
    let n = match word {
        "one" => 1.0,
        "two" => 2.0,
        "three" => 3.0,
        "four" => 4.0,
        "five" => 5.0,
        "six" => 6.0,
        "seven" => 7.0,
        "eight" => 8.0,
        "nine" => 9.0,
        "ten" => 10.0,
        _ => return None,
    };
    Some(n)
}

/// Nearest number within `span` words before index `i`.
fn number_before(words: &[String], i: usize, span: usize) -> Option<f64> {
    words[i.saturating_sub(span)..i]
        .iter()
        .rev()
        .find_map(|w| parse_number(w))
}
