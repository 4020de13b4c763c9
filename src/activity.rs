use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::models::{AgentPerformance, AgentRecord, DailyNote};

/// Trailing leave days at or above this count flag the agent as inactive.
pub const INACTIVITY_THRESHOLD_DAYS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySummary {
    pub consecutive_leave_days: i64,
    pub is_inactive: bool,
    pub last_activity_date: Option<NaiveDate>,
    pub total_notes: usize,
}

/// Parses a "YYYY-MM" month selector into its first and last calendar day.
pub fn month_bounds(month: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (year, month) = month.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;

    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next - Duration::days(1)))
}

fn is_leave_day(note: Option<&DailyNote>) -> bool {
    match note {
        None => true,
        Some(note) => note.is_leave || note.activity.trim().is_empty(),
    }
}

/// Reconstructs one agent's month from their daily notes.
///
/// The observable window runs from `month_start` to `min(month_end, today)`;
/// future dates in the selected month never count. Walking that window from
/// the most recent day backward, a day with no note, a leave-flagged note,
/// or a blank activity text extends the leave streak; the first working day
/// ends it and is also the last activity date.
pub fn analyze_notes(
    notes: &[DailyNote],
    month_start: NaiveDate,
    month_end: NaiveDate,
    today: NaiveDate,
) -> ActivitySummary {
    let by_date: HashMap<NaiveDate, &DailyNote> =
        notes.iter().map(|note| (note.note_date, note)).collect();

    let window_end = month_end.min(today);
    let window: Vec<NaiveDate> = month_start
        .iter_days()
        .take_while(|day| *day <= window_end)
        .collect();

    let mut consecutive_leave_days = 0i64;
    let mut last_activity_date = None;

    for day in window.iter().rev() {
        if is_leave_day(by_date.get(day).copied()) {
            consecutive_leave_days += 1;
        } else {
            last_activity_date = Some(*day);
            break;
        }
    }

    ActivitySummary {
        consecutive_leave_days,
        is_inactive: consecutive_leave_days >= INACTIVITY_THRESHOLD_DAYS,
        last_activity_date,
        total_notes: notes.len(),
    }
}

pub fn performance(agent: &AgentRecord, summary: ActivitySummary) -> AgentPerformance {
    AgentPerformance {
        agent_id: agent.id,
        agent_name: agent.name.clone(),
        agent_type: agent.role,
        mobile_number: agent.mobile_number.clone(),
        consecutive_leave_days: summary.consecutive_leave_days,
        is_inactive: summary.is_inactive,
        last_activity_date: summary.last_activity_date,
        total_notes: summary.total_notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOBILE: &str = "9847012345";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).expect("valid date")
    }

    fn active(d: u32, text: &str) -> DailyNote {
        DailyNote {
            mobile_number: MOBILE.to_string(),
            note_date: day(d),
            is_leave: false,
            activity: text.to_string(),
        }
    }

    fn leave(d: u32) -> DailyNote {
        DailyNote {
            mobile_number: MOBILE.to_string(),
            note_date: day(d),
            is_leave: true,
            activity: String::new(),
        }
    }

    fn july() -> (NaiveDate, NaiveDate) {
        month_bounds("2026-07").expect("valid month")
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        assert_eq!(month_bounds("2026-07"), Some((day(1), day(31))));
        assert_eq!(
            month_bounds("2026-12"),
            Some((
                NaiveDate::from_ymd_opt(2026, 12, 1).expect("valid date"),
                NaiveDate::from_ymd_opt(2026, 12, 31).expect("valid date"),
            ))
        );
        assert_eq!(month_bounds("2026-13"), None);
        assert_eq!(month_bounds("july"), None);
    }

    #[test]
    fn streak_stops_at_most_recent_working_day() {
        let notes = vec![active(18, "ward visit"), leave(19), leave(20)];
        let (start, end) = july();
        let summary = analyze_notes(&notes, start, end, day(20));

        assert_eq!(summary.consecutive_leave_days, 2);
        assert!(!summary.is_inactive);
        assert_eq!(summary.last_activity_date, Some(day(18)));
        assert_eq!(summary.total_notes, 3);
    }

    #[test]
    fn three_trailing_leave_days_flag_inactivity() {
        let notes = vec![active(17, "collection drive"), leave(18), leave(20)];
        let (start, end) = july();
        // 19th has no note at all; missing days count as leave.
        let summary = analyze_notes(&notes, start, end, day(20));

        assert_eq!(summary.consecutive_leave_days, 3);
        assert!(summary.is_inactive);
        assert_eq!(summary.last_activity_date, Some(day(17)));
    }

    #[test]
    fn blank_activity_counts_as_leave_even_without_leave_flag() {
        let notes = vec![active(18, "house survey"), active(19, "   "), active(20, "")];
        let (start, end) = july();
        let summary = analyze_notes(&notes, start, end, day(20));

        assert_eq!(summary.consecutive_leave_days, 2);
        assert_eq!(summary.last_activity_date, Some(day(18)));
    }

    #[test]
    fn zero_notes_makes_every_window_day_a_leave_day() {
        let (start, end) = july();
        let summary = analyze_notes(&[], start, end, day(10));

        assert_eq!(summary.consecutive_leave_days, 10);
        assert!(summary.is_inactive);
        assert_eq!(summary.last_activity_date, None);
        assert_eq!(summary.total_notes, 0);
    }

    #[test]
    fn window_is_capped_by_today_not_month_end() {
        let notes = vec![active(9, "beneficiary meeting")];
        let (start, end) = july();
        let summary = analyze_notes(&notes, start, end, day(10));

        // Only the 10th trails the last working day; 11..31 are future.
        assert_eq!(summary.consecutive_leave_days, 1);
        assert_eq!(summary.last_activity_date, Some(day(9)));
    }

    #[test]
    fn future_month_has_empty_window() {
        let (start, end) = july();
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).expect("valid date");
        let summary = analyze_notes(&[active(5, "mis-dated entry")], start, end, today);

        assert_eq!(summary.consecutive_leave_days, 0);
        assert!(!summary.is_inactive);
        assert_eq!(summary.last_activity_date, None);
        // Fetched notes still count even when the window is empty.
        assert_eq!(summary.total_notes, 1);
    }

    #[test]
    fn fully_active_month_has_no_streak() {
        let notes: Vec<DailyNote> = (1..=20).map(|d| active(d, "field rounds")).collect();
        let (start, end) = july();
        let summary = analyze_notes(&notes, start, end, day(20));

        assert_eq!(summary.consecutive_leave_days, 0);
        assert!(!summary.is_inactive);
        assert_eq!(summary.last_activity_date, Some(day(20)));
        assert_eq!(summary.total_notes, 20);
    }
}
