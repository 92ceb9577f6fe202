//! Weekly worked-time summary for one user.

use crate::models::session::Session;
use crate::utils::date::week_of;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub worked_minutes: i64,
    pub target_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekSummary {
    pub days: Vec<DayTotal>,
    pub total_minutes: i64,
    pub days_worked: usize,
    pub average_minutes: i64,
    pub overtime_minutes: i64,
}

/// Summarize closed sessions falling in the ISO week of `day`.
///
/// Open sessions are ignored: they have no duration yet. Weekend days carry
/// no target.
pub fn summarize_week(sessions: &[Session], day: NaiveDate, daily_target_minutes: i64) -> WeekSummary {
    use chrono::Datelike;

    let days: Vec<DayTotal> = week_of(day)
        .into_iter()
        .map(|d| {
            let worked = sessions
                .iter()
                .filter(|s| !s.is_open() && s.day() == d)
                .map(|s| s.duration_minutes.unwrap_or(0).max(0))
                .sum();
            let target = if d.weekday().number_from_monday() <= 5 {
                daily_target_minutes
            } else {
                0
            };
            DayTotal {
                date: d,
                worked_minutes: worked,
                target_minutes: target,
            }
        })
        .collect();

    let total_minutes: i64 = days.iter().map(|d| d.worked_minutes).sum();
    let days_worked = days.iter().filter(|d| d.worked_minutes > 0).count();
    let average_minutes = if days_worked > 0 {
        total_minutes / days_worked as i64
    } else {
        0
    };
    let expected: i64 = days
        .iter()
        .filter(|d| d.worked_minutes > 0)
        .map(|d| d.target_minutes)
        .sum();
    let overtime_minutes = (total_minutes - expected).max(0);

    WeekSummary {
        days,
        total_minutes,
        days_worked,
        average_minutes,
        overtime_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn closed(day: u32, minutes: i64) -> Session {
        let check_in = Utc.with_ymd_and_hms(2024, 1, day, 8, 30, 0).unwrap();
        Session {
            id: Some(format!("time-{day}")),
            user_id: "3".into(),
            check_in,
            check_out: Some(check_in + TimeDelta::minutes(minutes)),
            duration_minutes: Some(minutes),
            status: Default::default(),
            date: None,
            notes: None,
        }
    }

    #[test]
    fn week_totals_and_overtime() {
        let sessions = vec![
            closed(15, 510),
            closed(16, 450),
            closed(17, 492),
            closed(18, 546),
            closed(19, 468),
            closed(8, 600), // previous week
        ];
        let wed = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let s = summarize_week(&sessions, wed, 480);

        assert_eq!(s.total_minutes, 2466);
        assert_eq!(s.days_worked, 5);
        assert_eq!(s.average_minutes, 493);
        assert_eq!(s.overtime_minutes, 66);
        assert_eq!(s.days[5].target_minutes, 0);
    }

    #[test]
    fn weekend_work_is_all_overtime() {
        // 2024-01-15 is a Monday, 2024-01-20 a Saturday.
        let weekday_only = summarize_week(&[closed(15, 540)], NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), 480);
        assert_eq!(weekday_only.overtime_minutes, 60);

        let with_saturday = summarize_week(
            &[closed(15, 540), closed(20, 120)],
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            480,
        );
        assert_eq!(with_saturday.days_worked, 2);
        assert_eq!(with_saturday.overtime_minutes, 180);
    }

    #[test]
    fn open_sessions_do_not_count() {
        let mut open = closed(15, 0);
        open.check_out = None;
        open.duration_minutes = None;
        let s = summarize_week(&[open], NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), 480);
        assert_eq!(s.days_worked, 0);
        assert_eq!(s.average_minutes, 0);
        assert_eq!(s.overtime_minutes, 0);
    }
}
