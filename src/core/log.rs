use crate::db::log::{LogRow, load_log};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;

/// Color for each logged operation
fn color_for_operation(op: &str) -> Colour {
    match op {
        "check_in" => Colour::Green,
        "check_out" => Colour::Red,
        "adopt" => Colour::Yellow,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

pub struct LogLogic;

impl LogLogic {
    /// Render the internal log, one line per row, truncating long op/target
    /// columns to 60 visible characters.
    pub fn render(rows: &[LogRow]) -> String {
        if rows.is_empty() {
            return "📜 Internal log is empty.\n".to_string();
        }

        let id_w = rows.iter().map(|r| r.id.to_string().len()).max().unwrap_or(1);
        let date_w = rows.iter().map(|r| r.date.len()).max().unwrap_or(10);

        let visible: Vec<String> = rows
            .iter()
            .map(|row| {
                let op_target = if row.target.is_empty() {
                    row.operation.clone()
                } else {
                    format!("{} ({})", row.operation, row.target)
                };
                if op_target.chars().count() > 60 {
                    let mut s: String = op_target.chars().take(57).collect();
                    s.push_str("...");
                    s
                } else {
                    op_target
                }
            })
            .collect();
        let op_w = visible.iter().map(|v| v.chars().count()).max().unwrap_or(10);

        let mut out = String::from("📜 Internal log:\n\n");
        for (row, visible) in rows.iter().zip(visible) {
            let padding = " ".repeat(op_w.saturating_sub(visible.chars().count()));

            let colored = match visible.split_once(' ') {
                Some((op, rest)) => format!("{} {}", color_for_operation(&row.operation).paint(op), rest),
                None => color_for_operation(&row.operation).paint(visible.clone()).to_string(),
            };

            let date = chrono::DateTime::parse_from_rfc3339(&row.date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or_else(|_| row.date.clone());

            out.push_str(&format!(
                "{:>id_w$}: {:<date_w$} | {}{} => {}\n",
                row.id,
                date,
                colored,
                padding,
                row.message,
                id_w = id_w,
                date_w = date_w
            ));
        }
        out
    }

    pub fn print_log(pool: &mut DbPool) -> AppResult<()> {
        let rows = load_log(&pool.conn)?;
        print!("{}", Self::render(&rows));
        Ok(())
    }
}
