//! Approximate Hijri (lunisolar) calendar labels for streams of
//! moon-phase events.
//!
//! The crate takes a chronologically ordered sequence of lunar-phase
//! timestamps (new moon, first quarter, full moon, last quarter) and
//! attaches to each one a best-effort Hijri `(year, month, day)` derived
//! from a synodic-month day-count heuristic with a solar/lunar drift
//! correction for leap-month insertion. It is explicitly *not* a
//! reproduction of any official Hijri calendrical authority (such as
//! Umm al-Qura); expect dates to be approximate.
//!
//! # Modules
//!
//! - **[`estimator`]**: the core conversion state machine
//!   ([`HijriEstimator`]) and its data model ([`MoonPhaseEvent`],
//!   [`HijriLabel`]). Pure and I/O-free.
//! - **[`events`]**: the event source — parses tabular moon-phase data
//!   (CSV with `datetime` and `phase` columns) into sorted events and
//!   surfaces every malformed-input concern before the estimator runs.
//! - **[`calendar`]**: presentation — per-event calendar entries with
//!   titles and display colors, and an iCalendar (ICS) rendering.
//!
//! # Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use lunisolar_hijri::{format_hijri_label, MoonPhase, MoonPhaseEvent};
//! use lunisolar_hijri::estimator::process;
//!
//! let epoch = NaiveDate::from_ymd_opt(622, 7, 16)
//!     .unwrap()
//!     .and_hms_opt(0, 0, 0)
//!     .unwrap();
//! let labels = process(&[MoonPhaseEvent::new(epoch, MoonPhase::FullMoon)]);
//! assert_eq!(format_hijri_label(&labels[0]), "1 Muharram 1");
//! ```

pub mod calendar;
pub mod estimator;
pub mod events;

pub use estimator::{HijriEstimator, HijriLabel, MoonPhase, MoonPhaseEvent};
pub use events::read_events;

/// Hijri month names (index 1..12); index 0 is unused.
pub static HIJRI_MONTH_NAMES: [&str; 13] = [
    "",
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Ula",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

/// Returns the name of Hijri month `month` (1 = Muharram, ...,
/// 12 = Dhu al-Hijjah), or an empty string for an out-of-range index.
pub fn hijri_month_name(month: u32) -> &'static str {
    if (1..=12).contains(&month) {
        HIJRI_MONTH_NAMES[month as usize]
    } else {
        ""
    }
}

/// Formats a label as `"{year} {month name} {day}"`, or `"Pre-Hijri"` for
/// events that precede the epoch.
///
/// ```
/// use lunisolar_hijri::{format_hijri_label, HijriLabel};
///
/// let label = HijriLabel { year: Some(1445), month: 9, day: 12 };
/// assert_eq!(format_hijri_label(&label), "1445 Ramadan 12");
///
/// let pre = HijriLabel { year: None, month: 1, day: 1 };
/// assert_eq!(format_hijri_label(&pre), "Pre-Hijri");
/// ```
pub fn format_hijri_label(label: &HijriLabel) -> String {
    match label.year {
        Some(year) => format!("{} {} {}", year, hijri_month_name(label.month), label.day),
        None => "Pre-Hijri".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_cover_one_through_twelve() {
        assert_eq!(hijri_month_name(1), "Muharram");
        assert_eq!(hijri_month_name(9), "Ramadan");
        assert_eq!(hijri_month_name(12), "Dhu al-Hijjah");
        assert_eq!(hijri_month_name(0), "");
        assert_eq!(hijri_month_name(13), "");
    }

    #[test]
    fn labels_format_like_the_calendar_titles() {
        let label = HijriLabel {
            year: Some(1),
            month: 1,
            day: 1,
        };
        assert_eq!(format_hijri_label(&label), "1 Muharram 1");
    }

    #[test]
    fn pre_hijri_labels_format_as_a_marker() {
        let label = HijriLabel {
            year: None,
            month: 3,
            day: 17,
        };
        assert_eq!(format_hijri_label(&label), "Pre-Hijri");
    }
}
