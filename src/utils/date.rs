use chrono::{Datelike, Duration, NaiveDate};

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Monday..Sunday of the ISO week containing `day`.
pub fn week_of(day: NaiveDate) -> Vec<NaiveDate> {
    let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    (0..7).map(|i| monday + Duration::days(i)).collect()
}

pub fn weekday_short(day: NaiveDate) -> &'static str {
    match day.weekday() {
        chrono::Weekday::Mon => "Mon",
        chrono::Weekday::Tue => "Tue",
        chrono::Weekday::Wed => "Wed",
        chrono::Weekday::Thu => "Thu",
        chrono::Weekday::Fri => "Fri",
        chrono::Weekday::Sat => "Sat",
        chrono::Weekday::Sun => "Sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_starts_on_monday() {
        let wed = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let week = week_of(wed);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0], NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(week[6], NaiveDate::from_ymd_opt(2024, 1, 21).unwrap());
        assert_eq!(weekday_short(week[0]), "Mon");
    }
}
