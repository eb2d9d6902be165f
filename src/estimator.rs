//! estimator.rs
//!
//! The lunisolar Hijri date estimator: a single-pass state machine that
//! walks a chronologically ordered stream of moon-phase events and attaches
//! an approximate Hijri `(year, month, day)` to each one.
//!
//! # Overview
//!
//! The module provides:
//!
//! - **`MoonPhase`** / **`MoonPhaseEvent`**: the input record, a UTC
//!   timestamp paired with one of the four principal lunar phases.
//! - **`HijriLabel`**: the per-event output; the year is `None` for events
//!   that precede the Hijri epoch (622-07-16 Gregorian).
//! - **`HijriEstimator`**: the conversion state, advanced one event at a
//!   time via [`HijriEstimator::advance`].
//! - **`process(events)`**: folds a whole slice through a fresh estimator,
//!   returning one label per event in input order.
//!
//! The estimate is a day-count heuristic, not an astronomical computation:
//! nominal month lengths alternate 30/29 days, day counts advance from the
//! most recently observed full moon, and a running solar-vs-lunar drift
//! accumulator decides when an extra (embolismic) month must be inserted to
//! keep the lunar count loosely aligned with the solar year. At every full
//! moon the year estimate is additionally re-derived from the Gregorian
//! calendar year; this bounds the long-run error of the approximation at
//! the cost of an occasional visible jump. The re-derived value is
//! clamped against the incrementally tracked year so that labels never
//! move backward across consecutive full moons. None of this reproduces
//! an official Hijri calendrical authority such as Umm al-Qura.
//!
//! The estimator performs no I/O and never fails: malformed input is the
//! event source's concern (see `events.rs`), and the only non-ordinary
//! condition — a date before the epoch — is reported through the label
//! itself, never as an error.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Gregorian year in which the Hijri calendar begins.
pub const HIJRI_EPOCH_YEAR: i32 = 622;

/// Mean length of the solar (tropical) year, in days.
pub const SOLAR_YEAR_DAYS: f64 = 365.2422;

/// Length of twelve nominal synodic months, in days.
pub const LUNAR_YEAR_DAYS: f64 = 354.36707;

/// The fixed epoch reference instant: 622-07-16 00:00:00 UTC (proleptic
/// Gregorian). Events before this instant have no defined Hijri date.
pub fn hijri_epoch() -> NaiveDateTime {
    // The literal is a known-valid calendar date.
    NaiveDate::from_ymd_opt(HIJRI_EPOCH_YEAR, 7, 16)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// One of the four principal lunar phases.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MoonPhase {
    NewMoon,
    FirstQuarter,
    FullMoon,
    LastQuarter,
}

impl MoonPhase {
    /// Returns the conventional English name of the phase, as it appears
    /// in the tabular source data ("New Moon", "Full Moon", ...).
    pub fn name(&self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "New Moon",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::FullMoon => "Full Moon",
            MoonPhase::LastQuarter => "Last Quarter",
        }
    }
}

/// A single astronomical event: a lunar phase reached at a UTC instant.
///
/// The caller is responsible for feeding events to the estimator in
/// chronological order; the estimator assumes sorted input and its output
/// is unspecified otherwise.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MoonPhaseEvent {
    /// Absolute point in time, UTC.
    pub timestamp: NaiveDateTime,
    /// Which of the four phases occurred.
    pub phase: MoonPhase,
}

impl MoonPhaseEvent {
    pub fn new(timestamp: NaiveDateTime, phase: MoonPhase) -> Self {
        MoonPhaseEvent { timestamp, phase }
    }
}

/// The approximate Hijri date attached to one input event.
///
/// `year` is `None` for events that precede the Hijri epoch; such labels
/// are rendered as "Pre-Hijri" by [`crate::format_hijri_label`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HijriLabel {
    /// Hijri year, or `None` when the event is not convertible.
    pub year: Option<i32>,
    /// Hijri month in `1..=12`.
    pub month: u32,
    /// Hijri day of month, `1..=30`.
    pub day: u32,
}

impl HijriLabel {
    /// `true` when the event preceded the Hijri epoch and therefore has no
    /// defined Hijri date.
    pub fn is_pre_hijri(&self) -> bool {
        self.year.is_none()
    }
}

/// Converts an elapsed-solar-year count (measured from the epoch) into a
/// coarse 1-based Hijri year via the solar/lunar year-length ratio.
fn hijri_year_for_elapsed(solar_years: f64) -> i32 {
    (solar_years * (SOLAR_YEAR_DAYS / LUNAR_YEAR_DAYS)).floor() as i32 + 1
}

/// Conversion state for one pass over an event stream.
///
/// A given instance must see its events in chronological order and is
/// meant to be driven by exactly one caller; independent instances over
/// disjoint streams need no coordination, but splitting one stream across
/// instances changes the result and is not supported.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use lunisolar_hijri::estimator::{HijriEstimator, MoonPhase, MoonPhaseEvent};
///
/// let epoch = NaiveDate::from_ymd_opt(622, 7, 16)
///     .unwrap()
///     .and_hms_opt(0, 0, 0)
///     .unwrap();
/// let mut est = HijriEstimator::new();
/// let label = est.advance(&MoonPhaseEvent::new(epoch, MoonPhase::FullMoon));
/// assert_eq!(label.year, Some(1));
/// assert_eq!((label.month, label.day), (1, 1));
/// ```
#[derive(Debug, Clone)]
pub struct HijriEstimator {
    /// Current Hijri year; `None` until the first at/after-epoch event.
    year: Option<i32>,
    /// Current Hijri month, kept in `1..=12`.
    month: u32,
    /// Current Hijri day of month. Held as `i64` because it transiently
    /// exceeds the month length while a day delta is being folded in.
    day: i64,
    /// Selects the nominal month length: 30 days when set, 29 otherwise.
    /// Flips at every month boundary.
    is_odd_month: bool,
    /// Running excess of the solar year over twelve lunar months, in days.
    /// Reaching a full lunar year's worth triggers a leap month.
    accumulated_drift: f64,
    /// Timestamp of the most recently observed full moon; the anchor from
    /// which day counts advance.
    last_full_moon: Option<NaiveDateTime>,
}

impl HijriEstimator {
    /// Creates a fresh estimator positioned at day 1 of month 1, with no
    /// year established yet.
    pub fn new() -> Self {
        HijriEstimator {
            year: None,
            month: 1,
            day: 1,
            is_odd_month: true,
            accumulated_drift: 0.0,
            last_full_moon: None,
        }
    }

    /// Nominal length of the current month under the 30/29 alternation.
    fn nominal_month_len(&self) -> i64 {
        if self.is_odd_month {
            30
        } else {
            29
        }
    }

    /// Consumes one event and returns its label.
    ///
    /// Events strictly before the epoch (while no year has been
    /// established) produce a Pre-Hijri label and leave the state
    /// untouched. Otherwise the day count advances by the whole days
    /// elapsed since the last observed full moon, month and year
    /// boundaries are normalized, and — if this event is itself a full
    /// moon — the anchor moves here and the year is re-derived from the
    /// event's Gregorian calendar year (never below the incrementally
    /// tracked value, so successive labels cannot regress).
    pub fn advance(&mut self, event: &MoonPhaseEvent) -> HijriLabel {
        let epoch = hijri_epoch();

        if event.timestamp < epoch && self.year.is_none() {
            return HijriLabel {
                year: None,
                month: self.month,
                day: self.day as u32,
            };
        }

        // Seed the year on the first convertible event. This is a coarse
        // estimate; the next full moon re-derives it.
        let mut year = match self.year {
            Some(y) => y,
            None => {
                let elapsed_days =
                    event.timestamp.signed_duration_since(epoch).num_seconds() as f64 / 86_400.0;
                hijri_year_for_elapsed(elapsed_days / SOLAR_YEAR_DAYS)
            }
        };

        if let Some(anchor) = self.last_full_moon {
            let delta = event.timestamp.signed_duration_since(anchor).num_days();
            self.day += delta;

            // Normalize to a fixed point: each iteration strictly lowers
            // the day count, so the loop terminates. Month/year boundaries
            // and leap-month insertion happen only here.
            while self.day > self.nominal_month_len() {
                self.day -= self.nominal_month_len();
                self.month += 1;
                self.is_odd_month = !self.is_odd_month;

                if self.month > 12 {
                    self.month = 1;
                    year += 1;
                    self.accumulated_drift += SOLAR_YEAR_DAYS - LUNAR_YEAR_DAYS;
                    if self.accumulated_drift >= LUNAR_YEAR_DAYS {
                        // A full lunar year of drift has built up: insert
                        // an embolismic month right after the boundary.
                        self.month += 1;
                        self.accumulated_drift -= LUNAR_YEAR_DAYS;
                    }
                }
            }
        }

        if event.phase == MoonPhase::FullMoon {
            self.last_full_moon = Some(event.timestamp);
            // Re-anchor the coarse year estimate on the Gregorian calendar
            // year, clamped so it never undoes a rollover the overflow
            // loop has already applied: the correction only moves the
            // year forward.
            let anchored =
                hijri_year_for_elapsed((event.timestamp.year() - HIJRI_EPOCH_YEAR) as f64);
            year = year.max(anchored);
        }

        self.year = Some(year);
        HijriLabel {
            year: Some(year),
            month: self.month,
            day: self.day as u32,
        }
    }
}

impl Default for HijriEstimator {
    fn default() -> Self {
        HijriEstimator::new()
    }
}

/// Runs a fresh estimator over `events`, returning one label per event in
/// input order. Zero events yield an empty vector, not an error.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use lunisolar_hijri::estimator::{process, MoonPhase, MoonPhaseEvent};
///
/// let ts = NaiveDate::from_ymd_opt(600, 1, 1)
///     .unwrap()
///     .and_hms_opt(0, 0, 0)
///     .unwrap();
/// let labels = process(&[MoonPhaseEvent::new(ts, MoonPhase::NewMoon)]);
/// assert_eq!(labels.len(), 1);
/// assert!(labels[0].is_pre_hijri());
/// ```
pub fn process(events: &[MoonPhaseEvent]) -> Vec<HijriLabel> {
    let mut estimator = HijriEstimator::new();
    events.iter().map(|event| estimator.advance(event)).collect()
}
