//! events.rs
//!
//! The event source: turns tabular moon-phase data into the sorted
//! [`MoonPhaseEvent`] stream the estimator consumes.
//!
//! The expected input is a CSV file with a header row naming (at least) a
//! `datetime` and a `phase` column, such as the published
//! `moon-phases-601-to-4000-with-eclipses-UT.csv` tables. Timestamps are
//! `YYYY-MM-DD HH:MM:SS` in UT; date-only and `T`-separated forms are also
//! accepted. Phase labels may carry eclipse annotations after the phase
//! name ("Full Moon, Total Lunar Eclipse"), so a label is recognized by
//! its leading phase name, case-insensitively.
//!
//! All malformed-input concerns live here: unparseable timestamps,
//! unrecognized phase labels, and missing columns are reported as
//! [`EventSourceError`] before anything reaches the estimator, which
//! itself has no failure path. A file with a header and no data rows (or
//! an empty file) is not an error; it yields an empty event list.
//!
//! Parsed events are sorted by timestamp before being returned, so the
//! estimator's ordering precondition holds for any well-formed file.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::estimator::{MoonPhase, MoonPhaseEvent};

/// Errors from reading or parsing a moon-phase table.
#[derive(Debug)]
pub enum EventSourceError {
    /// The file could not be read.
    Io(io::Error),
    /// The header row lacks a required column.
    MissingColumn(&'static str),
    /// A row's timestamp field could not be parsed (1-based line number).
    BadTimestamp { line: usize, value: String },
    /// A row's phase field matches none of the four phase names.
    UnknownPhase { line: usize, value: String },
}

impl Display for EventSourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EventSourceError::Io(e) => write!(f, "I/O error: {}", e),
            EventSourceError::MissingColumn(name) => {
                write!(f, "header is missing the '{}' column", name)
            }
            EventSourceError::BadTimestamp { line, value } => {
                write!(f, "line {}: unparseable timestamp '{}'", line, value)
            }
            EventSourceError::UnknownPhase { line, value } => {
                write!(f, "line {}: unrecognized phase '{}'", line, value)
            }
        }
    }
}

impl Error for EventSourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EventSourceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EventSourceError {
    fn from(e: io::Error) -> Self {
        EventSourceError::Io(e)
    }
}

lazy_static! {
    /// Lowercased phase names, in the order they are probed. "Third
    /// Quarter" is an alias some tables use for the last quarter.
    static ref PHASE_LABELS: Vec<(&'static str, MoonPhase)> = vec![
        ("new moon", MoonPhase::NewMoon),
        ("first quarter", MoonPhase::FirstQuarter),
        ("full moon", MoonPhase::FullMoon),
        ("last quarter", MoonPhase::LastQuarter),
        ("third quarter", MoonPhase::LastQuarter),
    ];
}

/// Recognizes a phase label by its leading phase name, case-insensitively,
/// so eclipse-annotated labels still resolve.
///
/// ```
/// use lunisolar_hijri::estimator::MoonPhase;
/// use lunisolar_hijri::events::parse_phase;
///
/// assert_eq!(parse_phase("Full Moon"), Some(MoonPhase::FullMoon));
/// assert_eq!(
///     parse_phase("Full Moon, Total Lunar Eclipse"),
///     Some(MoonPhase::FullMoon)
/// );
/// assert_eq!(parse_phase("Waxing Gibbous"), None);
/// ```
pub fn parse_phase(label: &str) -> Option<MoonPhase> {
    let normalized = label.trim().to_lowercase();
    PHASE_LABELS
        .iter()
        .find(|(name, _)| normalized.starts_with(name))
        .map(|&(_, phase)| phase)
}

/// Matches `YYYY-MM-DD` with an optional ` HH:MM[:SS]` or `THH:MM[:SS]`
/// tail. Years may be three digits (the tables start at 601 CE).
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{3,4})-(\d{2})-(\d{2})(?:[ T](\d{2}):(\d{2})(?::(\d{2}))?)?$").unwrap()
});

/// Parses a timestamp field into a UTC instant. A missing time-of-day part
/// means midnight.
///
/// ```
/// use lunisolar_hijri::events::parse_timestamp;
///
/// assert!(parse_timestamp("0622-07-16 00:00:00").is_some());
/// assert!(parse_timestamp("601-01-06").is_some());
/// assert!(parse_timestamp("2024-04-08T18:17").is_some());
/// assert!(parse_timestamp("eighth of april").is_none());
/// ```
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let caps = TIMESTAMP_RE.captures(s.trim())?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?;
    let hour = field(4).unwrap_or(0);
    let minute = field(5).unwrap_or(0);
    let second = field(6).unwrap_or(0);
    date.and_hms_opt(hour, minute, second)
}

/// Splits one CSV line into fields, honoring double-quoted fields (with
/// `""` as an escaped quote) so that annotated phase labels containing
/// commas survive intact.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Parses header-carrying CSV lines into events, sorted by timestamp.
///
/// The first non-empty line is the header; the `datetime` and `phase`
/// columns are located in it case-insensitively. Blank lines are skipped.
/// No data rows (or no lines at all) yield an empty vector.
pub fn parse_events(lines: &[String]) -> Result<Vec<MoonPhaseEvent>, EventSourceError> {
    let mut iter = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = match iter.next() {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };
    let columns: HashMap<String, usize> = split_fields(header)
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect();
    let datetime_col = *columns
        .get("datetime")
        .ok_or(EventSourceError::MissingColumn("datetime"))?;
    let phase_col = *columns
        .get("phase")
        .ok_or(EventSourceError::MissingColumn("phase"))?;

    let mut events = Vec::new();
    for (idx, line) in iter {
        let fields = split_fields(line);
        let line_no = idx + 1;

        let raw_datetime = fields.get(datetime_col).map(String::as_str).unwrap_or("");
        let timestamp =
            parse_timestamp(raw_datetime).ok_or_else(|| EventSourceError::BadTimestamp {
                line: line_no,
                value: raw_datetime.to_string(),
            })?;

        let raw_phase = fields.get(phase_col).map(String::as_str).unwrap_or("");
        let phase = parse_phase(raw_phase).ok_or_else(|| EventSourceError::UnknownPhase {
            line: line_no,
            value: raw_phase.to_string(),
        })?;

        events.push(MoonPhaseEvent::new(timestamp, phase));
    }

    // The estimator assumes chronological order; a stable sort makes that
    // hold even for files whose rows are shuffled.
    events.sort_by_key(|event| event.timestamp);
    Ok(events)
}

/// Reads a moon-phase CSV file (UTF-8, with or without a BOM) and parses
/// it into a sorted event list.
///
/// ```no_run
/// use lunisolar_hijri::events::read_events;
///
/// # fn main() -> Result<(), lunisolar_hijri::events::EventSourceError> {
/// let events = read_events("data/moon-phases-601-to-4000-with-eclipses-UT.csv")?;
/// println!("{} events", events.len());
/// # Ok(())
/// # }
/// ```
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<MoonPhaseEvent>, EventSourceError> {
    let content = fs::read_to_string(path)?;
    let content = content.trim_start_matches('\u{FEFF}');
    let lines: Vec<String> = content.lines().map(|line| line.to_string()).collect();
    parse_events(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn lines(rows: &[&str]) -> Vec<String> {
        rows.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn phase_labels_resolve_case_insensitively() {
        assert_eq!(parse_phase("new moon"), Some(MoonPhase::NewMoon));
        assert_eq!(parse_phase("FIRST QUARTER"), Some(MoonPhase::FirstQuarter));
        assert_eq!(parse_phase(" Last Quarter "), Some(MoonPhase::LastQuarter));
        assert_eq!(parse_phase("Third Quarter"), Some(MoonPhase::LastQuarter));
        assert_eq!(parse_phase("Blue Moon"), None);
    }

    #[test]
    fn eclipse_annotations_do_not_hide_the_phase() {
        assert_eq!(
            parse_phase("Full Moon, Partial Lunar Eclipse"),
            Some(MoonPhase::FullMoon)
        );
        assert_eq!(
            parse_phase("New Moon, Annular Solar Eclipse"),
            Some(MoonPhase::NewMoon)
        );
    }

    #[test]
    fn timestamps_parse_in_all_supported_forms() {
        let full = parse_timestamp("0622-07-16 04:30:15").unwrap();
        assert_eq!(
            (full.year(), full.month(), full.day()),
            (622, 7, 16)
        );
        assert_eq!((full.hour(), full.minute(), full.second()), (4, 30, 15));

        let date_only = parse_timestamp("601-01-06").unwrap();
        assert_eq!((date_only.year(), date_only.hour()), (601, 0));

        let iso = parse_timestamp("2024-04-08T18:17").unwrap();
        assert_eq!((iso.hour(), iso.minute(), iso.second()), (18, 17, 0));

        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("0622-13-40").is_none());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn quoted_fields_keep_embedded_commas() {
        let fields = split_fields(r#"0700-01-01 00:00:00,"Full Moon, Total Lunar Eclipse",x"#);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1], "Full Moon, Total Lunar Eclipse");
    }

    #[test]
    fn rows_parse_and_sort_by_timestamp() {
        let input = lines(&[
            "datetime,phase,eclipse",
            "0622-08-15 12:00:00,Full Moon,",
            "",
            "0622-07-16 00:00:00,Full Moon,",
            "0622-07-31 06:00:00,New Moon,",
        ]);
        let events = parse_events(&input).unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(events[0].phase, MoonPhase::FullMoon);
        assert_eq!(events[1].phase, MoonPhase::NewMoon);
    }

    #[test]
    fn header_columns_are_located_case_insensitively() {
        let input = lines(&["Phase,Datetime", "Full Moon,0622-07-16 00:00:00"]);
        let events = parse_events(&input).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, MoonPhase::FullMoon);
    }

    #[test]
    fn missing_columns_are_reported() {
        let input = lines(&["datetime,kind", "0622-07-16 00:00:00,Full Moon"]);
        match parse_events(&input) {
            Err(EventSourceError::MissingColumn(name)) => assert_eq!(name, "phase"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn bad_rows_are_reported_with_line_numbers() {
        let input = lines(&[
            "datetime,phase",
            "0622-07-16 00:00:00,Full Moon",
            "garbage,Full Moon",
        ]);
        match parse_events(&input) {
            Err(EventSourceError::BadTimestamp { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "garbage");
            }
            other => panic!("expected BadTimestamp, got {:?}", other),
        }

        let input = lines(&["datetime,phase", "0622-07-16 00:00:00,Waxing Gibbous"]);
        match parse_events(&input) {
            Err(EventSourceError::UnknownPhase { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "Waxing Gibbous");
            }
            other => panic!("expected UnknownPhase, got {:?}", other),
        }
    }

    #[test]
    fn empty_input_is_not_an_error() {
        assert!(parse_events(&[]).unwrap().is_empty());
        assert!(parse_events(&lines(&["datetime,phase"])).unwrap().is_empty());
        assert!(parse_events(&lines(&["", "  "])).unwrap().is_empty());
    }
}
