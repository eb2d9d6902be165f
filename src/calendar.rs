//! calendar.rs
//!
//! Presentation helpers: turns the estimator's output into per-event
//! calendar entries and renders them as an iCalendar (ICS) document.
//!
//! An entry carries everything a calendar widget needs to display one
//! moon-phase event: a title (phase name, plus the Hijri date once the
//! event is convertible), the Gregorian start instant, pre-formatted Hijri
//! and Gregorian date strings, and the per-phase display colors. The ICS
//! rendering builds a vector of lines with `format!()` and places each
//! event as an all-day `VEVENT`.

use chrono::NaiveDateTime;

use crate::estimator::{process, MoonPhase, MoonPhaseEvent};
use crate::format_hijri_label;

/// Background color used for a phase when drawing its calendar entry.
pub fn phase_color(phase: MoonPhase) -> &'static str {
    match phase {
        MoonPhase::NewMoon => "rgb(0, 231, 255)",
        MoonPhase::FirstQuarter => "#66CCFF",
        MoonPhase::FullMoon => "#FFFF00",
        MoonPhase::LastQuarter => "#FF9933",
    }
}

/// Text color paired with [`phase_color`]: the bright full- and new-moon
/// backgrounds take black text, the quarters white.
pub fn phase_text_color(phase: MoonPhase) -> &'static str {
    match phase {
        MoonPhase::FullMoon | MoonPhase::NewMoon => "black",
        _ => "white",
    }
}

/// One displayable calendar entry, derived from an event and its label.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CalendarEntry {
    /// Entry title, e.g. `"Full Moon - Hijri: 1 Muharram 1"`. Pre-Hijri
    /// entries carry the bare phase name.
    pub title: String,
    /// Gregorian start instant of the (all-day) entry.
    pub start: NaiveDateTime,
    /// Formatted Hijri date, or `"Pre-Hijri"`.
    pub hijri_date: String,
    /// Gregorian date as `YYYY-MM-DD`.
    pub gregorian_date: String,
    /// The phase the entry represents.
    pub phase: MoonPhase,
    /// Display colors for the entry.
    pub background_color: &'static str,
    pub text_color: &'static str,
}

/// Builds one entry per event by running the estimator over the whole
/// (chronologically ordered) slice and zipping its labels back in.
///
/// ```
/// use chrono::NaiveDate;
/// use lunisolar_hijri::calendar::build_entries;
/// use lunisolar_hijri::estimator::{MoonPhase, MoonPhaseEvent};
///
/// let epoch = NaiveDate::from_ymd_opt(622, 7, 16)
///     .unwrap()
///     .and_hms_opt(0, 0, 0)
///     .unwrap();
/// let entries = build_entries(&[MoonPhaseEvent::new(epoch, MoonPhase::FullMoon)]);
/// assert_eq!(entries[0].title, "Full Moon - Hijri: 1 Muharram 1");
/// assert_eq!(entries[0].gregorian_date, "0622-07-16");
/// ```
pub fn build_entries(events: &[MoonPhaseEvent]) -> Vec<CalendarEntry> {
    let labels = process(events);
    events
        .iter()
        .zip(labels)
        .map(|(event, label)| {
            let hijri_date = format_hijri_label(&label);
            let title = if label.is_pre_hijri() {
                event.phase.name().to_string()
            } else {
                format!("{} - Hijri: {}", event.phase.name(), hijri_date)
            };
            CalendarEntry {
                title,
                start: event.timestamp,
                hijri_date,
                gregorian_date: event.timestamp.format("%Y-%m-%d").to_string(),
                phase: event.phase,
                background_color: phase_color(event.phase),
                text_color: phase_text_color(event.phase),
            }
        })
        .collect()
}

/// Earliest event timestamp, used as the initial view anchor of a calendar
/// widget. `None` for an empty slice.
pub fn earliest_start(events: &[MoonPhaseEvent]) -> Option<NaiveDateTime> {
    events.iter().map(|event| event.timestamp).min()
}

/// Escapes the characters that iCalendar TEXT values reserve.
fn escape_ics_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders entries as the lines of a minimal ICS document, one all-day
/// `VEVENT` per entry.
pub fn ical_lines(entries: &[CalendarEntry]) -> Vec<String> {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//lunisolar-hijri//EN".to_string(),
    ];
    for entry in entries {
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!(
            "DTSTART;VALUE=DATE:{}",
            entry.start.format("%Y%m%d")
        ));
        lines.push(format!("SUMMARY:{}", escape_ics_text(&entry.title)));
        lines.push(format!(
            "DESCRIPTION:Gregorian {} / {}",
            entry.gregorian_date,
            escape_ics_text(&entry.hijri_date)
        ));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn colors_follow_the_phase() {
        assert_eq!(phase_color(MoonPhase::FullMoon), "#FFFF00");
        assert_eq!(phase_text_color(MoonPhase::FullMoon), "black");
        assert_eq!(phase_text_color(MoonPhase::NewMoon), "black");
        assert_eq!(phase_text_color(MoonPhase::FirstQuarter), "white");
        assert_eq!(phase_text_color(MoonPhase::LastQuarter), "white");
    }

    #[test]
    fn pre_hijri_entries_carry_the_bare_phase_name() {
        let entries = build_entries(&[MoonPhaseEvent::new(ts(600, 1, 1), MoonPhase::NewMoon)]);
        assert_eq!(entries[0].title, "New Moon");
        assert_eq!(entries[0].hijri_date, "Pre-Hijri");
        assert_eq!(entries[0].gregorian_date, "0600-01-01");
    }

    #[test]
    fn entries_match_events_one_to_one() {
        let events = vec![
            MoonPhaseEvent::new(ts(600, 1, 1), MoonPhase::NewMoon),
            MoonPhaseEvent::new(ts(622, 7, 16), MoonPhase::FullMoon),
            MoonPhaseEvent::new(ts(622, 8, 15), MoonPhase::FullMoon),
        ];
        let entries = build_entries(&events);
        assert_eq!(entries.len(), events.len());
        assert_eq!(entries[1].title, "Full Moon - Hijri: 1 Muharram 1");
        assert_eq!(entries[2].title, "Full Moon - Hijri: 1 Safar 1");
    }

    #[test]
    fn earliest_start_scans_the_whole_slice() {
        let events = vec![
            MoonPhaseEvent::new(ts(700, 1, 1), MoonPhase::FullMoon),
            MoonPhaseEvent::new(ts(601, 1, 6), MoonPhase::NewMoon),
        ];
        assert_eq!(earliest_start(&events), Some(ts(601, 1, 6)));
        assert_eq!(earliest_start(&[]), None);
    }

    #[test]
    fn ics_output_wraps_each_entry_in_a_vevent() {
        let entries = build_entries(&[MoonPhaseEvent::new(ts(622, 7, 16), MoonPhase::FullMoon)]);
        let lines = ical_lines(&entries);
        assert_eq!(lines.first().map(String::as_str), Some("BEGIN:VCALENDAR"));
        assert_eq!(lines.last().map(String::as_str), Some("END:VCALENDAR"));
        assert!(lines.contains(&"DTSTART;VALUE=DATE:06220716".to_string()));
        assert!(lines
            .iter()
            .any(|l| l == "SUMMARY:Full Moon - Hijri: 1 Muharram 1"));
        assert_eq!(lines.iter().filter(|l| *l == "BEGIN:VEVENT").count(), 1);
    }
}
