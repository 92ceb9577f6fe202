//! Formatting utilities used for CLI outputs and the live clock.

use chrono::TimeDelta;

pub fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

/// Elapsed time as `HH:MM:SS`, zero-padded. Negative values render as zero.
pub fn format_hms(elapsed: TimeDelta) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

pub fn mins2readable(mins: i64, want_sign: bool, short: bool) -> String {
    let abs_m = mins.abs();
    let hours = abs_m / 60;
    let minutes = abs_m % 60;

    let sign = if mins > 0 && want_sign {
        "+"
    } else if mins < 0 && want_sign {
        "-"
    } else {
        ""
    };

    if short {
        // es: +02:25 oppure -01:10
        format!("{}{:02}:{:02}", sign, hours, minutes)
    } else {
        // es: +02h 25m oppure -01h 10m
        format!("{}{:02}h {:02}m", sign, hours, minutes)
    }
}

/// Minutes as decimal hours with one digit, e.g. 525 → "8.8h".
pub fn decimal_hours(mins: i64) -> String {
    format!("{:.1}h", mins as f64 / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_is_zero_padded() {
        assert_eq!(format_hms(TimeDelta::seconds(5)), "00:00:05");
        assert_eq!(format_hms(TimeDelta::seconds(7 * 3600 + 45 * 60 + 23)), "07:45:23");
    }

    #[test]
    fn hms_keeps_counting_past_a_day() {
        assert_eq!(format_hms(TimeDelta::hours(26)), "26:00:00");
    }

    #[test]
    fn hms_never_renders_negative() {
        assert_eq!(format_hms(TimeDelta::seconds(-30)), "00:00:00");
    }

    #[test]
    fn readable_minutes_are_hours_and_minutes_not_decimal() {
        // 8h45 must never read as "8.75"
        assert_eq!(mins2readable(525, false, false), "08h 45m");
        assert_eq!(mins2readable(-70, true, true), "-01:10");
        assert_eq!(decimal_hours(525), "8.8h");
    }
}
