//! Team presence: buckets per-user sessions into present / break / absent.
//! Pure functions over their inputs; nothing here fetches or stores data.

use crate::core::engine::IDLE_DISPLAY;
use crate::models::presence::{PresenceEntry, PresenceInput, PresenceStatus};
use crate::utils::format_hms;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceFilter {
    All,
    Present,
    Break,
    Absent,
}

impl PresenceFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(Self::All),
            "present" => Some(Self::Present),
            "break" => Some(Self::Break),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceOrder {
    UserId,
    /// Longest running first; absent users last.
    LongestElapsed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PresenceCounts {
    pub present: usize,
    pub on_break: usize,
    pub absent: usize,
}

impl PresenceCounts {
    pub fn total(&self) -> usize {
        self.present + self.on_break + self.absent
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresenceReport {
    pub present: Vec<PresenceEntry>,
    pub on_break: Vec<PresenceEntry>,
    pub absent: Vec<PresenceEntry>,
    /// Every entry in input order, for "all" views.
    #[serde(skip)]
    ordered: Vec<PresenceEntry>,
}

/// Build the report at instant `now`. Buckets keep the input order.
pub fn aggregate(inputs: &[PresenceInput], now: DateTime<Utc>) -> PresenceReport {
    let mut report = PresenceReport::default();

    for input in inputs {
        let since = match input.status {
            PresenceStatus::Absent => None,
            _ => input.session.as_ref().map(|s| s.check_in),
        };
        let elapsed_display = match since {
            Some(start) => format_hms((now - start).max(TimeDelta::zero())),
            None => IDLE_DISPLAY.to_string(),
        };
        let entry = PresenceEntry {
            user_id: input.user_id.clone(),
            status: input.status,
            since,
            elapsed_display,
        };

        match input.status {
            PresenceStatus::Present => report.present.push(entry.clone()),
            PresenceStatus::Break => report.on_break.push(entry.clone()),
            PresenceStatus::Absent => report.absent.push(entry.clone()),
        }
        report.ordered.push(entry);
    }

    report
}

impl PresenceReport {
    pub fn counts(&self) -> PresenceCounts {
        PresenceCounts {
            present: self.present.len(),
            on_break: self.on_break.len(),
            absent: self.absent.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.counts().total()
    }

    /// e.g. "3/5 present"
    pub fn headline(&self) -> String {
        format!("{}/{} present", self.present.len(), self.total())
    }

    pub fn filter(&self, filter: PresenceFilter) -> Vec<&PresenceEntry> {
        match filter {
            PresenceFilter::All => self.ordered.iter().collect(),
            PresenceFilter::Present => self.present.iter().collect(),
            PresenceFilter::Break => self.on_break.iter().collect(),
            PresenceFilter::Absent => self.absent.iter().collect(),
        }
    }

    /// Filtered entries in the requested order (stable for ties).
    pub fn sorted(&self, filter: PresenceFilter, order: PresenceOrder) -> Vec<&PresenceEntry> {
        let mut rows = self.filter(filter);
        match order {
            PresenceOrder::UserId => rows.sort_by(|a, b| a.user_id.cmp(&b.user_id)),
            // earliest start = longest elapsed; None sorts after Some
            PresenceOrder::LongestElapsed => rows.sort_by_key(|e| (e.since.is_none(), e.since)),
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Session;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 20, h, m, s).unwrap()
    }

    fn open(user: &str, start: DateTime<Utc>) -> Option<Session> {
        Some(Session {
            id: Some(format!("time-{user}")),
            user_id: user.into(),
            check_in: start,
            check_out: None,
            duration_minutes: None,
            status: Default::default(),
            date: None,
            notes: None,
        })
    }

    fn team() -> Vec<PresenceInput> {
        vec![
            PresenceInput::new("1", PresenceStatus::Present, open("1", at(8, 30, 0))),
            PresenceInput::new("2", PresenceStatus::Break, open("2", at(9, 0, 0))),
            PresenceInput::new("3", PresenceStatus::Present, open("3", at(8, 15, 0))),
            PresenceInput::new("4", PresenceStatus::Absent, None),
            PresenceInput::new("5", PresenceStatus::Present, open("5", at(8, 45, 0))),
        ]
    }

    #[test]
    fn counts_cover_every_input_once() {
        let report = aggregate(&team(), at(16, 15, 23));
        let c = report.counts();
        assert_eq!((c.present, c.on_break, c.absent), (3, 1, 1));
        assert_eq!(c.total(), 5);
        assert_eq!(report.headline(), "3/5 present");
    }

    #[test]
    fn elapsed_is_derived_from_session_start() {
        let report = aggregate(&team(), at(16, 15, 23));
        assert_eq!(report.present[0].elapsed_display, "07:45:23");
        assert_eq!(report.on_break[0].elapsed_display, "07:15:23");
        assert_eq!(report.absent[0].elapsed_display, "00:00:00");
        assert_eq!(report.absent[0].since, None);
    }

    #[test]
    fn buckets_keep_input_order() {
        let report = aggregate(&team(), at(12, 0, 0));
        let ids: Vec<&str> = report.present.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "5"]);
        let all: Vec<&str> = report
            .filter(PresenceFilter::All)
            .iter()
            .map(|e| e.user_id.as_str())
            .collect();
        assert_eq!(all, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn sorting_only_on_request() {
        let report = aggregate(&team(), at(12, 0, 0));
        let ids: Vec<&str> = report
            .sorted(PresenceFilter::All, PresenceOrder::LongestElapsed)
            .iter()
            .map(|e| e.user_id.as_str())
            .collect();
        assert_eq!(ids, vec!["3", "1", "5", "2", "4"]);
    }

    #[test]
    fn elapsed_never_decreases_between_ticks() {
        let inputs = team();
        let first = aggregate(&inputs, at(12, 0, 0));
        let second = aggregate(&inputs, at(12, 0, 1));
        for (a, b) in first
            .filter(PresenceFilter::All)
            .iter()
            .zip(second.filter(PresenceFilter::All))
        {
            assert!(b.elapsed_display >= a.elapsed_display);
        }
    }

    #[test]
    fn filter_parse_accepts_known_buckets() {
        assert_eq!(PresenceFilter::parse("Break"), Some(PresenceFilter::Break));
        assert_eq!(PresenceFilter::parse("late"), None);
    }
}
