/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

use crate::models::presence::PresenceStatus;

pub fn color_for_presence(status: PresenceStatus) -> &'static str {
    match status {
        PresenceStatus::Present => GREEN,
        PresenceStatus::Break => YELLOW,
        PresenceStatus::Absent => RED,
    }
}

/// Overtime color:
/// \>0 → green
/// 0 → grey
pub fn color_for_overtime(value: i64) -> &'static str {
    if value > 0 { GREEN } else { GREY }
}
